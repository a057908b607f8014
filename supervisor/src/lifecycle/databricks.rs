//! Databricks serving-endpoints REST client (`/api/2.0/serving-endpoints`).

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::error::{LifecycleError, ServingError};
use super::rest::{RestClient, RestError};
use super::serving::{EndpointStatus, ServedEntity, ServingClient};

const ENDPOINTS_PATH: &str = "api/2.0/serving-endpoints";

fn serving_error(e: RestError) -> ServingError {
    match e {
        RestError::Api(api) => ServingError::Api(api),
        RestError::Transport(e) => ServingError::Transport(e),
        RestError::InvalidUrl(msg) => ServingError::InvalidRequest(msg),
    }
}

/// Serving client for a Databricks workspace, authenticated with a personal access token.
#[derive(Debug, Clone)]
pub struct DatabricksServing {
    rest: RestClient,
}

impl DatabricksServing {
    pub fn new(host: &str, token: impl Into<String>) -> Result<Self, LifecycleError> {
        Ok(Self {
            rest: RestClient::new(host, Some(token.into()))?,
        })
    }

    /// Current state of `name`; `deploy` does not need it, callers may poll with it.
    pub async fn get_endpoint(&self, name: &str) -> Result<EndpointStatus, ServingError> {
        let path = format!("{}/{}", ENDPOINTS_PATH, name);
        self.rest.get(&path, &[]).await.map_err(serving_error)
    }
}

#[async_trait]
impl ServingClient for DatabricksServing {
    async fn create_endpoint(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError> {
        debug!(endpoint = name, model = %entity.entity_name, version = %entity.entity_version, "creating serving endpoint");
        let body = json!({
            "name": name,
            "config": { "served_entities": [entity] },
        });
        self.rest.post(ENDPOINTS_PATH, &body).await.map_err(serving_error)
    }

    async fn update_config(&self, name: &str, entity: &ServedEntity) -> Result<EndpointStatus, ServingError> {
        debug!(endpoint = name, model = %entity.entity_name, version = %entity.entity_version, "updating serving endpoint config");
        let path = format!("{}/{}/config", ENDPOINTS_PATH, name);
        let body = json!({ "served_entities": [entity] });
        self.rest.put(&path, &body).await.map_err(serving_error)
    }

}
