//! Model-serving endpoints: the client seam plus an in-memory backend.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ServingError};

/// Compute size of a served entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl WorkloadSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadSize::Small => "Small",
            WorkloadSize::Medium => "Medium",
            WorkloadSize::Large => "Large",
        }
    }
}

impl fmt::Display for WorkloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadSize {
    type Err = String;

    /// Case-insensitive `small` / `medium` / `large`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(WorkloadSize::Small),
            "medium" => Ok(WorkloadSize::Medium),
            "large" => Ok(WorkloadSize::Large),
            _ => Err(format!(
                "unknown workload size {:?} (expected Small, Medium or Large)",
                s
            )),
        }
    }
}

/// One registered model version served by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedEntity {
    pub entity_name: String,
    pub entity_version: String,
    pub workload_size: WorkloadSize,
    pub scale_to_zero_enabled: bool,
}

impl ServedEntity {
    /// Scale-to-zero is always enabled for supervisor endpoints.
    pub fn new(entity_name: impl Into<String>, entity_version: impl Into<String>, workload_size: WorkloadSize) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_version: entity_version.into(),
            workload_size,
            scale_to_zero_enabled: true,
        }
    }
}

/// Endpoint state as reported by the serving backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_update: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub name: String,
    #[serde(default)]
    pub state: EndpointState,
}

/// Serving backend: create an endpoint or replace its served entities.
#[async_trait]
pub trait ServingClient: Send + Sync {
    async fn create_endpoint(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError>;

    async fn update_config(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError>;
}

/// What an [`InMemoryServing`] received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServingCall {
    Create(String, ServedEntity),
    UpdateConfig(String, ServedEntity),
}

/// Process-local serving backend that records every call.
///
/// Creating an endpoint that exists fails with the same error text a real workspace returns.
#[derive(Debug, Default)]
pub struct InMemoryServing {
    endpoints: Mutex<HashMap<String, ServedEntity>>,
    calls: Mutex<Vec<ServingCall>>,
    create_failure: Mutex<Option<ApiError>>,
}

impl InMemoryServing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates an endpoint.
    pub fn with_endpoint(self, name: impl Into<String>, entity: ServedEntity) -> Self {
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.insert(name.into(), entity);
        }
        self
    }

    /// Makes every `create_endpoint` fail with `error`.
    pub fn failing_create(self, error: ApiError) -> Self {
        if let Ok(mut failure) = self.create_failure.lock() {
            *failure = Some(error);
        }
        self
    }

    pub fn calls(&self) -> Vec<ServingCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ServingCall::UpdateConfig(..)))
            .count()
    }

    pub fn served(&self, name: &str) -> Option<ServedEntity> {
        self.endpoints.lock().ok()?.get(name).cloned()
    }

    fn record(&self, call: ServingCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn status(name: &str, config_update: &str) -> EndpointStatus {
        EndpointStatus {
            name: name.to_string(),
            state: EndpointState {
                ready: Some("READY".into()),
                config_update: Some(config_update.into()),
            },
        }
    }
}

#[async_trait]
impl ServingClient for InMemoryServing {
    async fn create_endpoint(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError> {
        self.record(ServingCall::Create(name.to_string(), entity.clone()));
        if let Some(err) = self.create_failure.lock().ok().and_then(|f| f.clone()) {
            return Err(err.into());
        }
        let mut endpoints = self
            .endpoints
            .lock()
            .map_err(|_| ApiError::new(500, "INTERNAL_ERROR", "endpoint table poisoned"))?;
        if endpoints.contains_key(name) {
            return Err(ApiError::new(
                409,
                "RESOURCE_ALREADY_EXISTS",
                format!("Endpoint with name '{}' already exists.", name),
            )
            .into());
        }
        endpoints.insert(name.to_string(), entity.clone());
        Ok(Self::status(name, "NOT_UPDATING"))
    }

    async fn update_config(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError> {
        self.record(ServingCall::UpdateConfig(name.to_string(), entity.clone()));
        let mut endpoints = self
            .endpoints
            .lock()
            .map_err(|_| ApiError::new(500, "INTERNAL_ERROR", "endpoint table poisoned"))?;
        match endpoints.get_mut(name) {
            Some(served) => {
                *served = entity.clone();
                Ok(Self::status(name, "IN_PROGRESS"))
            }
            None => Err(ApiError::new(
                404,
                "RESOURCE_DOES_NOT_EXIST",
                format!("Serving endpoint with name {} does not exist.", name),
            )
            .into()),
        }
    }
}
