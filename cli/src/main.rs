//! `supervisor-deploy`: publish the supervisor graph as a new model version and serve it.
//!
//! No options. Reads `DATABRICKS_HOST` and `DATABRICKS_TOKEN` (after applying `.env`
//! and `~/.config/supervisor/config.toml`); model and endpoint names come from the
//! optional `[deploy]` table of that file.

use clap::Parser;
use cli::{publish_and_deploy, DeployPlan, APP_NAME};
use config::WorkspaceCredentials;
use supervisor::{build_supervisor_graph, DatabricksServing, MlflowRegistry, SupervisorLlms};

#[derive(Parser, Debug)]
#[command(name = "supervisor-deploy", version)]
#[command(about = "Publish the agent supervisor graph to MLflow and deploy it to a serving endpoint")]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _args = Args::parse();
    let loaded = config::load_and_apply(APP_NAME, None);
    let _log_guard = config::tracing_init::init("info")?;
    if let Err(e) = loaded {
        tracing::warn!(error = %e, "could not apply .env / XDG config");
    }

    let credentials = WorkspaceCredentials::from_env()?;
    let settings = config::load_deploy_settings(APP_NAME)?;
    let plan = DeployPlan::from_settings(&settings)?;
    tracing::info!(host = %credentials.host, model = %plan.model_name, endpoint = %plan.endpoint_name, "deploying");

    let graph = build_supervisor_graph(SupervisorLlms::openai())?;
    let registry = MlflowRegistry::new(&credentials.host, Some(credentials.token.clone()))?;
    let serving = DatabricksServing::new(&credentials.host, credentials.token.clone())?;

    let outcome = publish_and_deploy(&graph, &registry, &serving, &plan).await?;
    println!(
        "Published {} version {}; endpoint {} now serves version {}",
        outcome.published.name, outcome.published.version, plan.endpoint_name, outcome.served.version
    );
    Ok(())
}
