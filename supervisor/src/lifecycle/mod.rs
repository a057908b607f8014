//! Model lifecycle: signature inference, artifact registry, serving endpoints.
//!
//! [`publish`] turns a compiled [`SupervisorGraph`](crate::agent::SupervisorGraph) into a
//! registered model version; [`deploy`] points a serving endpoint at that version.
//! Both talk to their backends through traits ([`ArtifactRegistry`], [`ServingClient`])
//! with REST ([`MlflowRegistry`], [`DatabricksServing`]) and in-memory implementations.

mod databricks;
mod deploy;
mod error;
mod mlflow;
mod registry;
mod rest;
mod serving;
mod signature;

pub use databricks::DatabricksServing;
pub use deploy::{deploy, publish, ALREADY_EXISTS_MARKER};
pub use error::{ApiError, LifecycleError, RegistrationError, ServingError};
pub use mlflow::{
    MlflowRegistry, INPUT_EXAMPLE_FILE, MLMODEL_FILE, MODEL_DIR, TAG_FLAVOR, TAG_GRAPH,
    TAG_INPUT_EXAMPLE, TAG_SIGNATURE, TAG_TRACE,
};
pub use registry::{
    validate_model_name, ArtifactHandle, ArtifactRegistry, InMemoryRegistry, ModelArtifact,
    SUPERVISOR_FLAVOR,
};
pub use serving::{
    EndpointState, EndpointStatus, InMemoryServing, ServedEntity, ServingCall, ServingClient,
    WorkloadSize,
};
pub use signature::{infer_schema, infer_signature, ColSpec, DataType, Schema, Signature, SignatureError};
