//! Errors for publishing and deploying the supervisor graph.

use thiserror::Error;

use crate::error::AgentError;

use super::signature::SignatureError;

/// Error body returned by the MLflow and serving REST APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status} {error_code}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub error_code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

/// Model name rejected by the registry (empty, malformed, or owned by another flavor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot register model {name:?}: {reason}")]
pub struct RegistrationError {
    pub name: String,
    pub reason: String,
}

impl RegistrationError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a serving backend.
#[derive(Debug, Error)]
pub enum ServingError {
    #[error("serving endpoint request rejected: {0}")]
    Api(#[from] ApiError),

    #[error("serving endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request could not be built (e.g. an endpoint name that does not form a URL).
    #[error("invalid serving endpoint request: {0}")]
    InvalidRequest(String),
}

/// Error from `publish`, `deploy` and the registry/serving clients.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Any endpoint failure other than "already exists" on create, unchanged.
    #[error(transparent)]
    Serving(#[from] ServingError),

    /// MLflow tracking call rejected for a reason other than naming.
    #[error("tracking server rejected request: {0}")]
    Tracking(ApiError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The graph failed on the sample input.
    #[error("sample invocation failed: {0}")]
    Graph(#[from] AgentError),

    #[error("signature inference failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("MLmodel serialization failed: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: the API message text survives into ServingError's Display.
    #[test]
    fn serving_api_error_keeps_message_text() {
        let err = ServingError::from(ApiError::new(
            409,
            "RESOURCE_ALREADY_EXISTS",
            "Endpoint with name 'x' already exists.",
        ));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn registration_error_names_model() {
        let err: LifecycleError = RegistrationError::new("", "name must not be empty").into();
        assert!(err.to_string().contains("name must not be empty"));
    }
}
