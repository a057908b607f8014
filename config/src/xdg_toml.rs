//! Load `[env]` and `[deploy]` tables from `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::{DeploySettings, LoadError};

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let config_dir = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into()))?,
    };
    let path = config_dir.join(app_name).join("config.toml");
    if path.exists() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    deploy: Option<DeploySettings>,
}

fn load_file(app_name: &str) -> Result<ConfigFile, LoadError> {
    let path = match xdg_config_path(app_name)? {
        Some(p) => p,
        None => return Ok(ConfigFile::default()),
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

/// Returns env key-value pairs from `[env]` section. Missing file or empty section returns empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(load_file(app_name)?.env)
}

/// Returns the `[deploy]` section, or defaults when the file or section is missing.
pub fn load_deploy_settings(app_name: &str) -> Result<DeploySettings, LoadError> {
    Ok(load_file(app_name)?.deploy.unwrap_or_default())
}
