//! Read a project `.env` into a key-value map (applied to the process env in lib).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `override_dir` if given, else in the current directory.
fn env_file_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Load `.env` without touching the process environment. Missing file returns an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, dotenv::Error> {
    let Some(path) = env_file_path(override_dir) else {
        return Ok(HashMap::new());
    };
    dotenv::from_path_iter(&path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn reads_pairs_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# serving workspace\nDATABRICKS_HOST=https://dbc.example.com\nDATABRICKS_TOKEN=\"dapi-123\"\n",
        )
        .unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(
            m.get("DATABRICKS_HOST").map(String::as_str),
            Some("https://dbc.example.com")
        );
        assert_eq!(m.get("DATABRICKS_TOKEN").map(String::as_str), Some("dapi-123"));
    }
}
