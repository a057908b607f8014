//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! The same XDG file may carry a `[deploy]` table with model/endpoint names used by the
//! deployment binary; see [`DeploySettings`].

mod env_file;
#[cfg(feature = "tracing-init")]
pub mod tracing_init;
mod xdg_toml;

use std::path::Path;
use thiserror::Error;

pub use xdg_toml::load_deploy_settings;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(#[from] dotenv::Error),
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Names and sizing for publishing and deploying the supervisor model.
///
/// Every field has a default, so a `[deploy]` table only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub model_name: String,
    pub experiment_name: String,
    pub endpoint_name: String,
    /// `Small`, `Medium` or `Large`.
    pub workload_size: String,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            model_name: "agent-supervisor".to_string(),
            experiment_name: "/agent-in-a-week".to_string(),
            endpoint_name: "agent-supervisor-endpoint".to_string(),
            workload_size: "Small".to_string(),
        }
    }
}

/// Host and token of the serving workspace, read from `DATABRICKS_HOST` / `DATABRICKS_TOKEN`.
#[derive(Clone)]
pub struct WorkspaceCredentials {
    pub host: String,
    pub token: String,
}

impl std::fmt::Debug for WorkspaceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceCredentials")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl WorkspaceCredentials {
    pub const HOST_VAR: &'static str = "DATABRICKS_HOST";
    pub const TOKEN_VAR: &'static str = "DATABRICKS_TOKEN";

    /// Reads both variables from the process environment. Call after [`load_and_apply`].
    pub fn from_env() -> Result<Self, LoadError> {
        let read = |key: &'static str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(LoadError::MissingVar(key))
        };
        Ok(Self {
            host: read(Self::HOST_VAR)?.trim_end_matches('/').to_string(),
            token: read(Self::TOKEN_VAR)?,
        })
    }
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set (so existing env has highest priority).
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue;
        }
        if let Some(v) = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)) {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}

/// Serialises tests that mutate process-wide env vars.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
