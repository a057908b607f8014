//! Model artifact registry: where published graphs are recorded and versioned.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::NodeSpan;

use super::error::{LifecycleError, RegistrationError};
use super::signature::Signature;

/// Flavor recorded for every supervisor-graph artifact.
pub const SUPERVISOR_FLAVOR: &str = "supervisor-graph";

/// Everything logged for one published model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub experiment: String,
    pub flavor: String,
    pub signature: Signature,
    pub input_example: Value,
    /// Text description of the compiled graph.
    pub graph_description: String,
    /// Node spans from the sample invocation.
    #[serde(default)]
    pub trace: Vec<NodeSpan>,
}

/// A registered model version, as referenced by serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub name: String,
    pub version: String,
    /// `models:/<name>/<version>`.
    pub uri: String,
}

impl ArtifactHandle {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        let uri = format!("models:/{}/{}", name, version);
        Self { name, version, uri }
    }
}

/// Registry of versioned model artifacts.
///
/// Logging under a name that already exists creates the next version.
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Records the artifact in its experiment and registers a new version of `artifact.name`.
    async fn log_model(&self, artifact: &ModelArtifact) -> Result<ArtifactHandle, LifecycleError>;

    /// Latest registered version with no stage assigned.
    async fn latest_version(&self, name: &str) -> Result<ArtifactHandle, LifecycleError>;
}

/// Rejects names the registry cannot store or address in a `models:/` URI.
pub fn validate_model_name(name: &str) -> Result<(), RegistrationError> {
    if name.trim().is_empty() {
        return Err(RegistrationError::new(name, "name must not be empty"));
    }
    if name.trim() != name {
        return Err(RegistrationError::new(name, "name must not have surrounding whitespace"));
    }
    if let Some(c) = name.chars().find(|c| *c == '/' || *c == ':' || c.is_control()) {
        return Err(RegistrationError::new(
            name,
            format!("name must not contain {:?}", c),
        ));
    }
    Ok(())
}

/// Process-local registry; versions count up from 1 per name.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    models: Mutex<HashMap<String, Vec<ModelArtifact>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All versions logged under `name`, oldest first.
    pub fn versions(&self, name: &str) -> Vec<ModelArtifact> {
        self.models
            .lock()
            .map(|m| m.get(name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArtifactRegistry for InMemoryRegistry {
    async fn log_model(&self, artifact: &ModelArtifact) -> Result<ArtifactHandle, LifecycleError> {
        validate_model_name(&artifact.name)?;
        let mut models = self
            .models
            .lock()
            .map_err(|_| LifecycleError::Config("registry lock poisoned".into()))?;
        let versions = models.entry(artifact.name.clone()).or_default();
        if let Some(existing) = versions.first() {
            if existing.flavor != artifact.flavor {
                return Err(RegistrationError::new(
                    &artifact.name,
                    format!("registered model exists with flavor {:?}", existing.flavor),
                )
                .into());
            }
        }
        versions.push(artifact.clone());
        Ok(ArtifactHandle::new(&artifact.name, versions.len().to_string()))
    }

    async fn latest_version(&self, name: &str) -> Result<ArtifactHandle, LifecycleError> {
        let count = self.versions(name).len();
        if count == 0 {
            return Err(RegistrationError::new(name, "no registered versions").into());
        }
        Ok(ArtifactHandle::new(name, count.to_string()))
    }
}
