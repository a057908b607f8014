//! MLflow tracking/registry REST client (`/api/2.0/mlflow/...`).
//!
//! `log_model` resolves (or creates) the experiment, opens a run, records the artifact
//! metadata as run tags and the sample trace as metrics, writes `MLmodel` and
//! `input_example.json` under `<artifact_uri>/model`, then registers a new model version
//! sourced from there. A run that fails after it was opened is closed as FAILED.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{ApiError, LifecycleError, RegistrationError};
use super::registry::{validate_model_name, ArtifactHandle, ArtifactRegistry, ModelArtifact};
use super::rest::{RestClient, RestError};

const ALREADY_EXISTS: &str = "RESOURCE_ALREADY_EXISTS";
const DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

/// Run tag keys written by `log_model`.
pub const TAG_FLAVOR: &str = "supervisor.flavor";
pub const TAG_SIGNATURE: &str = "supervisor.signature";
pub const TAG_INPUT_EXAMPLE: &str = "supervisor.input_example";
pub const TAG_GRAPH: &str = "supervisor.graph";
pub const TAG_TRACE: &str = "supervisor.trace";

/// Directory under the run's artifact root that the model version is sourced from.
pub const MODEL_DIR: &str = "model";
pub const MLMODEL_FILE: &str = "MLmodel";
pub const INPUT_EXAMPLE_FILE: &str = "input_example.json";

#[derive(Debug, Deserialize)]
struct ExperimentResponse {
    experiment: Experiment,
}

#[derive(Debug, Deserialize)]
struct Experiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    info: RunInfo,
}

#[derive(Debug, Deserialize)]
struct RunInfo {
    run_id: String,
    #[serde(default)]
    artifact_uri: String,
}

#[derive(Debug, Deserialize)]
struct ModelVersionResponse {
    model_version: ModelVersion,
}

#[derive(Debug, Deserialize)]
struct ModelVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn tracking_error(e: RestError) -> LifecycleError {
    match e {
        RestError::Api(api) => LifecycleError::Tracking(api),
        RestError::Transport(e) => LifecycleError::Http(e),
        RestError::InvalidUrl(msg) => LifecycleError::Config(msg),
    }
}

#[derive(Debug, Serialize)]
struct MlModelFile<'a> {
    artifact_path: &'static str,
    flavors: BTreeMap<&'a str, FlavorConfig<'a>>,
    model_uuid: String,
    run_id: &'a str,
    saved_input_example_info: InputExampleInfo,
    signature: MlModelSignature,
}

#[derive(Debug, Serialize)]
struct FlavorConfig<'a> {
    graph: &'a str,
}

#[derive(Debug, Serialize)]
struct InputExampleInfo {
    artifact_path: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Column lists are stored JSON-encoded, as MLflow expects.
#[derive(Debug, Serialize)]
struct MlModelSignature {
    inputs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<String>,
}

/// Renders the `MLmodel` descriptor for `artifact` logged under `run_id`.
fn mlmodel_yaml(artifact: &ModelArtifact, run_id: &str) -> Result<String, LifecycleError> {
    let outputs = match &artifact.signature.outputs {
        Some(schema) => Some(serde_json::to_string(&schema.columns)?),
        None => None,
    };
    let file = MlModelFile {
        artifact_path: MODEL_DIR,
        flavors: BTreeMap::from([(
            artifact.flavor.as_str(),
            FlavorConfig {
                graph: &artifact.graph_description,
            },
        )]),
        model_uuid: uuid::Uuid::new_v4().simple().to_string(),
        run_id,
        saved_input_example_info: InputExampleInfo {
            artifact_path: INPUT_EXAMPLE_FILE,
            kind: "json_object",
        },
        signature: MlModelSignature {
            inputs: serde_json::to_string(&artifact.signature.inputs.columns)?,
            outputs,
        },
    };
    Ok(serde_yaml::to_string(&file)?)
}

/// Where the run's artifacts live and how to write them.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArtifactStore {
    /// `mlflow-artifacts:` root, written through the tracking server's artifact proxy.
    Proxy(String),
    /// `dbfs:` root, written through the DBFS API.
    Dbfs(String),
}

/// Resolves the model directory under `artifact_uri`.
fn model_store(artifact_uri: &str) -> Result<ArtifactStore, LifecycleError> {
    let url = Url::parse(artifact_uri).map_err(|e| {
        LifecycleError::Config(format!("invalid artifact root {:?}: {}", artifact_uri, e))
    })?;
    let dir = format!("{}/{}", url.path().trim_end_matches('/'), MODEL_DIR);
    match url.scheme() {
        "mlflow-artifacts" => Ok(ArtifactStore::Proxy(dir)),
        "dbfs" => Ok(ArtifactStore::Dbfs(dir)),
        other => Err(LifecycleError::Config(format!(
            "unsupported artifact root scheme {:?} in {:?}",
            other, artifact_uri
        ))),
    }
}

/// Run tags: flavor first, then signature, example, graph text and the sample trace.
fn run_tags(artifact: &ModelArtifact) -> Result<serde_json::Value, LifecycleError> {
    let signature = serde_json::to_string(&artifact.signature)?;
    let input_example = serde_json::to_string(&artifact.input_example)?;
    let trace = serde_json::to_string(&artifact.trace)?;
    Ok(json!([
        { "key": TAG_FLAVOR, "value": artifact.flavor },
        { "key": TAG_SIGNATURE, "value": signature },
        { "key": TAG_INPUT_EXAMPLE, "value": input_example },
        { "key": TAG_GRAPH, "value": artifact.graph_description },
        { "key": TAG_TRACE, "value": trace },
    ]))
}

/// One `span.<node>.duration_ms` metric per span; `step` is the span's position in the run.
fn span_metrics(artifact: &ModelArtifact, timestamp: u64) -> serde_json::Value {
    artifact
        .trace
        .iter()
        .enumerate()
        .map(|(step, span)| {
            json!({
                "key": format!("span.{}.duration_ms", span.node_id),
                "value": span.duration_ms as f64,
                "timestamp": timestamp,
                "step": step,
            })
        })
        .collect()
}

/// MLflow registry reached over REST, e.g. a Databricks workspace.
#[derive(Debug, Clone)]
pub struct MlflowRegistry {
    rest: RestClient,
}

impl MlflowRegistry {
    /// `host` is the tracking server root; `token` is sent as a bearer token when set.
    pub fn new(host: &str, token: Option<String>) -> Result<Self, LifecycleError> {
        Ok(Self {
            rest: RestClient::new(host, token)?,
        })
    }

    async fn experiment_id(&self, name: &str) -> Result<String, LifecycleError> {
        let found: Result<ExperimentResponse, RestError> = self
            .rest
            .get(
                "api/2.0/mlflow/experiments/get-by-name",
                &[("experiment_name", name)],
            )
            .await;
        match found {
            Ok(r) => Ok(r.experiment.experiment_id),
            Err(RestError::Api(ApiError { error_code, .. })) if error_code == DOES_NOT_EXIST => {
                info!(experiment = name, "creating experiment");
                let created: CreateExperimentResponse = self
                    .rest
                    .post("api/2.0/mlflow/experiments/create", &json!({ "name": name }))
                    .await
                    .map_err(tracking_error)?;
                Ok(created.experiment_id)
            }
            Err(e) => Err(tracking_error(e)),
        }
    }

    /// Creates the registered model; an existing one is reused and gets the next version.
    async fn ensure_registered_model(&self, name: &str) -> Result<(), LifecycleError> {
        let created: Result<IgnoredAny, RestError> = self
            .rest
            .post("api/2.0/mlflow/registered-models/create", &json!({ "name": name }))
            .await;
        match created {
            Ok(_) => {
                info!(model = name, "registered new model");
                Ok(())
            }
            Err(RestError::Api(api)) if api.error_code == ALREADY_EXISTS => {
                debug!(model = name, "registered model exists, adding a version");
                Ok(())
            }
            Err(RestError::Api(api)) => {
                Err(RegistrationError::new(name, format!("{}: {}", api.error_code, api.message)).into())
            }
            Err(RestError::Transport(e)) => Err(LifecycleError::Http(e)),
            Err(RestError::InvalidUrl(msg)) => Err(LifecycleError::Config(msg)),
        }
    }

    async fn upload(
        &self,
        store: &ArtifactStore,
        file: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), LifecycleError> {
        let uploaded: Result<IgnoredAny, RestError> = match store {
            ArtifactStore::Proxy(dir) => {
                let path = format!("api/2.0/mlflow-artifacts/artifacts{}/{}", dir, file);
                self.rest.put_bytes(&path, bytes, content_type).await
            }
            ArtifactStore::Dbfs(dir) => {
                let contents = base64::engine::general_purpose::STANDARD.encode(&bytes);
                let body = json!({
                    "path": format!("{}/{}", dir, file),
                    "contents": contents,
                    "overwrite": true,
                });
                self.rest.post("api/2.0/dbfs/put", &body).await
            }
        };
        uploaded.map_err(tracking_error)?;
        debug!(file, "uploaded model file");
        Ok(())
    }

    /// Everything after the run is opened; on error the caller closes the run as FAILED.
    async fn record_version(
        &self,
        info: &RunInfo,
        artifact: &ModelArtifact,
    ) -> Result<ArtifactHandle, LifecycleError> {
        let tags = run_tags(artifact)?;
        let _: IgnoredAny = self
            .rest
            .post(
                "api/2.0/mlflow/runs/log-batch",
                &json!({
                    "run_id": info.run_id,
                    "tags": tags,
                    "metrics": span_metrics(artifact, now_millis()),
                }),
            )
            .await
            .map_err(tracking_error)?;

        let store = model_store(&info.artifact_uri)?;
        let mlmodel = mlmodel_yaml(artifact, &info.run_id)?;
        self.upload(&store, MLMODEL_FILE, mlmodel.into_bytes(), "text/yaml").await?;
        let example = serde_json::to_vec(&artifact.input_example)?;
        self.upload(&store, INPUT_EXAMPLE_FILE, example, "application/json").await?;

        self.ensure_registered_model(&artifact.name).await?;

        let source = format!("{}/{}", info.artifact_uri.trim_end_matches('/'), MODEL_DIR);
        let created: ModelVersionResponse = self
            .rest
            .post(
                "api/2.0/mlflow/model-versions/create",
                &json!({ "name": artifact.name, "source": source, "run_id": info.run_id }),
            )
            .await
            .map_err(tracking_error)?;

        self.close_run(&info.run_id, "FINISHED").await?;
        Ok(ArtifactHandle::new(&artifact.name, created.model_version.version))
    }

    async fn close_run(&self, run_id: &str, status: &str) -> Result<(), LifecycleError> {
        let _: IgnoredAny = self
            .rest
            .post(
                "api/2.0/mlflow/runs/update",
                &json!({ "run_id": run_id, "status": status, "end_time": now_millis() }),
            )
            .await
            .map_err(tracking_error)?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactRegistry for MlflowRegistry {
    async fn log_model(&self, artifact: &ModelArtifact) -> Result<ArtifactHandle, LifecycleError> {
        validate_model_name(&artifact.name)?;
        let experiment_id = self.experiment_id(&artifact.experiment).await?;

        let run: CreateRunResponse = self
            .rest
            .post(
                "api/2.0/mlflow/runs/create",
                &json!({
                    "experiment_id": experiment_id,
                    "run_name": artifact.name,
                    "start_time": now_millis(),
                }),
            )
            .await
            .map_err(tracking_error)?;
        let run_info = run.run.info;
        debug!(run_id = %run_info.run_id, experiment_id = %experiment_id, "opened run");

        match self.record_version(&run_info, artifact).await {
            Ok(handle) => {
                info!(model = %handle.name, version = %handle.version, "logged model");
                Ok(handle)
            }
            Err(e) => {
                if let Err(close) = self.close_run(&run_info.run_id, "FAILED").await {
                    warn!(run_id = %run_info.run_id, error = %close, "could not mark run failed");
                }
                Err(e)
            }
        }
    }

    async fn latest_version(&self, name: &str) -> Result<ArtifactHandle, LifecycleError> {
        let latest: LatestVersionsResponse = self
            .rest
            .post(
                "api/2.0/mlflow/registered-models/get-latest-versions",
                &json!({ "name": name, "stages": ["None"] }),
            )
            .await
            .map_err(tracking_error)?;
        latest
            .model_versions
            .into_iter()
            .next()
            .map(|v| ArtifactHandle::new(name, v.version))
            .ok_or_else(|| RegistrationError::new(name, "no registered versions").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeSpan;
    use crate::lifecycle::registry::SUPERVISOR_FLAVOR;
    use crate::lifecycle::signature::infer_signature;

    fn artifact() -> ModelArtifact {
        let input = json!({"messages": [{"role": "user", "content": "Hello"}]});
        let output = json!({"decision": "respond"});
        ModelArtifact {
            name: "agent-supervisor".into(),
            experiment: "/agent-in-a-week".into(),
            flavor: SUPERVISOR_FLAVOR.into(),
            signature: infer_signature(&input, Some(&output)).unwrap(),
            input_example: input,
            graph_description: "supervisor -> generate_response".into(),
            trace: vec![NodeSpan {
                node_id: "supervisor".into(),
                start_ms: 0,
                duration_ms: 12,
                ok: true,
            }],
        }
    }

    #[test]
    fn model_store_by_scheme() {
        assert_eq!(
            model_store("dbfs:/databricks/mlflow-tracking/42/run-1/artifacts").unwrap(),
            ArtifactStore::Dbfs("/databricks/mlflow-tracking/42/run-1/artifacts/model".into())
        );
        assert_eq!(
            model_store("mlflow-artifacts:/42/run-1/artifacts/").unwrap(),
            ArtifactStore::Proxy("/42/run-1/artifacts/model".into())
        );
        assert_eq!(
            model_store("mlflow-artifacts://tracking:5000/42/run-1/artifacts").unwrap(),
            ArtifactStore::Proxy("/42/run-1/artifacts/model".into())
        );
        assert!(matches!(
            model_store("s3://bucket/42/run-1/artifacts"),
            Err(LifecycleError::Config(_))
        ));
        assert!(matches!(model_store(""), Err(LifecycleError::Config(_))));
    }

    /// **Scenario**: MLmodel names the flavor, the run, the example file and both schemas.
    #[test]
    fn mlmodel_describes_flavor_signature_and_example() {
        let yaml = mlmodel_yaml(&artifact(), "run-1").unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["artifact_path"].as_str(), Some(MODEL_DIR));
        assert_eq!(doc["run_id"].as_str(), Some("run-1"));
        assert_eq!(
            doc["flavors"][SUPERVISOR_FLAVOR]["graph"].as_str(),
            Some("supervisor -> generate_response")
        );
        assert_eq!(
            doc["saved_input_example_info"]["artifact_path"].as_str(),
            Some(INPUT_EXAMPLE_FILE)
        );
        let inputs: serde_json::Value =
            serde_json::from_str(doc["signature"]["inputs"].as_str().unwrap()).unwrap();
        assert_eq!(inputs[0]["name"], "messages");
        assert_eq!(inputs[0]["type"], "array");
        assert!(doc["signature"]["outputs"].as_str().unwrap().contains("decision"));
    }

    #[test]
    fn span_metrics_key_by_node() {
        let metrics = span_metrics(&artifact(), 1_700_000_000_000);
        assert_eq!(
            metrics,
            json!([{
                "key": "span.supervisor.duration_ms",
                "value": 12.0,
                "timestamp": 1_700_000_000_000u64,
                "step": 0
            }])
        );
    }

    /// **Scenario**: a URL that could not be built is a configuration error, not a tracking error.
    #[test]
    fn invalid_url_is_config_error() {
        let err = tracking_error(RestError::InvalidUrl("bad path".into()));
        assert!(matches!(err, LifecycleError::Config(ref msg) if msg == "bad path"));
    }
}
