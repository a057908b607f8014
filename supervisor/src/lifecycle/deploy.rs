//! Publish the supervisor graph as a model version, then serve it.

use serde_json::Value;
use tracing::{info, warn};

use crate::agent::{InvocationRequest, SupervisorGraph};

use super::error::LifecycleError;
use super::registry::{ArtifactHandle, ArtifactRegistry, ModelArtifact, SUPERVISOR_FLAVOR};
use super::serving::{EndpointStatus, ServedEntity, ServingClient, WorkloadSize};
use super::signature::infer_signature;

/// Creation failures whose text contains this are treated as "update instead".
pub const ALREADY_EXISTS_MARKER: &str = "already exists";

/// Runs `graph` on the sample request, infers the signature and logs a new version of
/// `model_name` under `experiment`, together with the node spans of that run.
pub async fn publish(
    graph: &SupervisorGraph,
    registry: &dyn ArtifactRegistry,
    model_name: &str,
    experiment: &str,
) -> Result<ArtifactHandle, LifecycleError> {
    let request = InvocationRequest::sample();
    let input: Value = serde_json::to_value(&request)?;
    let (response, trace) = graph.invoke_traced(request, None).await?;
    let output: Value = serde_json::to_value(&response)?;
    let signature = infer_signature(&input, Some(&output))?;

    let artifact = ModelArtifact {
        name: model_name.to_string(),
        experiment: experiment.to_string(),
        flavor: SUPERVISOR_FLAVOR.to_string(),
        signature,
        input_example: input,
        graph_description: graph.describe(),
        trace,
    };
    let handle = registry.log_model(&artifact).await?;
    info!(model = %handle.name, version = %handle.version, uri = %handle.uri, "published model");
    Ok(handle)
}

/// Serves `handle` from `endpoint_name`, creating the endpoint or, when it already
/// exists, replacing its config exactly once. Other failures propagate unchanged.
pub async fn deploy(
    client: &dyn ServingClient,
    handle: &ArtifactHandle,
    endpoint_name: &str,
    workload_size: WorkloadSize,
) -> Result<EndpointStatus, LifecycleError> {
    let entity = ServedEntity::new(&handle.name, &handle.version, workload_size);
    match client.create_endpoint(endpoint_name, &entity).await {
        Ok(status) => {
            info!(endpoint = endpoint_name, version = %handle.version, "created serving endpoint");
            Ok(status)
        }
        Err(e) if e.to_string().contains(ALREADY_EXISTS_MARKER) => {
            warn!(endpoint = endpoint_name, "endpoint already exists, updating config");
            let status = client.update_config(endpoint_name, &entity).await?;
            info!(endpoint = endpoint_name, version = %handle.version, "updated serving endpoint");
            Ok(status)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::error::{ApiError, ServingError};
    use crate::lifecycle::serving::{InMemoryServing, ServingCall};

    fn handle() -> ArtifactHandle {
        ArtifactHandle::new("agent-supervisor", "2")
    }

    #[tokio::test]
    async fn creates_new_endpoint_with_scale_to_zero() {
        let serving = InMemoryServing::new();
        deploy(&serving, &handle(), "ep", WorkloadSize::Small).await.unwrap();
        let served = serving.served("ep").unwrap();
        assert_eq!(served.entity_version, "2");
        assert!(served.scale_to_zero_enabled);
        assert_eq!(serving.update_count(), 0);
    }

    #[tokio::test]
    async fn existing_endpoint_is_updated_once() {
        let serving = InMemoryServing::new()
            .with_endpoint("ep", ServedEntity::new("agent-supervisor", "1", WorkloadSize::Small));
        deploy(&serving, &handle(), "ep", WorkloadSize::Medium).await.unwrap();

        assert_eq!(serving.update_count(), 1);
        let expected = ServedEntity::new("agent-supervisor", "2", WorkloadSize::Medium);
        assert_eq!(
            serving.calls(),
            vec![
                ServingCall::Create("ep".into(), expected.clone()),
                ServingCall::UpdateConfig("ep".into(), expected.clone()),
            ]
        );
        assert_eq!(serving.served("ep"), Some(expected));
    }

    #[tokio::test]
    async fn other_create_failures_propagate() {
        let serving = InMemoryServing::new().failing_create(ApiError::new(
            403,
            "PERMISSION_DENIED",
            "User does not have permission to create endpoints.",
        ));
        let err = deploy(&serving, &handle(), "ep", WorkloadSize::Small)
            .await
            .unwrap_err();
        match err {
            LifecycleError::Serving(ServingError::Api(api)) => {
                assert_eq!(api.error_code, "PERMISSION_DENIED")
            }
            other => panic!("expected serving error, got {:?}", other),
        }
        assert_eq!(serving.update_count(), 0);
    }
}
