//! Publish-then-deploy pipeline behind the `supervisor-deploy` binary.
//!
//! The binary wires MLflow and Databricks clients; the pipeline itself only sees the
//! [`ArtifactRegistry`] and [`ServingClient`] traits.

use config::DeploySettings;
use supervisor::{
    deploy, publish, ArtifactHandle, ArtifactRegistry, CompilationError, EndpointStatus,
    LifecycleError, ServingClient, SupervisorGraph, WorkloadSize,
};
use thiserror::Error;
use tracing::info;

/// `.env` / XDG application name (`~/.config/supervisor/config.toml`).
pub const APP_NAME: &str = "supervisor";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] config::LoadError),

    #[error("invalid deploy setting: {0}")]
    InvalidSetting(String),

    #[error("build graph: {0}")]
    Compile(#[from] CompilationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Resolved names and size for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub model_name: String,
    pub experiment_name: String,
    pub endpoint_name: String,
    pub workload_size: WorkloadSize,
}

impl DeployPlan {
    pub fn from_settings(settings: &DeploySettings) -> Result<Self, CliError> {
        let workload_size = settings
            .workload_size
            .parse::<WorkloadSize>()
            .map_err(CliError::InvalidSetting)?;
        if settings.endpoint_name.trim().is_empty() {
            return Err(CliError::InvalidSetting("endpoint_name must not be empty".into()));
        }
        Ok(Self {
            model_name: settings.model_name.clone(),
            experiment_name: settings.experiment_name.clone(),
            endpoint_name: settings.endpoint_name.clone(),
            workload_size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub published: ArtifactHandle,
    /// Latest unstaged version, the one actually served.
    pub served: ArtifactHandle,
    pub status: EndpointStatus,
}

/// Publishes `graph`, looks up the latest unstaged version and serves it.
pub async fn publish_and_deploy(
    graph: &SupervisorGraph,
    registry: &dyn ArtifactRegistry,
    serving: &dyn ServingClient,
    plan: &DeployPlan,
) -> Result<DeployOutcome, CliError> {
    let published = publish(graph, registry, &plan.model_name, &plan.experiment_name).await?;
    let served = registry.latest_version(&plan.model_name).await?;
    info!(published = %published.version, served = %served.version, "resolved model version");
    let status = deploy(serving, &served, &plan.endpoint_name, plan.workload_size).await?;
    Ok(DeployOutcome {
        published,
        served,
        status,
    })
}
