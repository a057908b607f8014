//! Per-invocation configuration: a read-only keyed bag handed to every node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Run-time parameters for one graph invocation (e.g. the addressee `name`).
///
/// Nodes read it through `RunContext::config`; nothing writes to it during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnableConfig {
    #[serde(default)]
    pub configurable: Map<String, Value>,
}

impl RunnableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one configurable key (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.configurable.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.configurable.get(key)
    }

    /// Returns the value under `key` when it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.configurable.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_str_ignores_non_string_values() {
        let config = RunnableConfig::new().with("name", "Alice").with("retries", 3);
        assert_eq!(config.get_str("name"), Some("Alice"));
        assert_eq!(config.get_str("retries"), None);
        assert_eq!(config.get("retries"), Some(&Value::from(3)));
        assert_eq!(config.get_str("missing"), None);
    }

    #[test]
    fn deserializes_configurable_table() {
        let config: RunnableConfig =
            serde_json::from_str(r#"{"configurable":{"name":"Bob"}}"#).unwrap();
        assert_eq!(config.get_str("name"), Some("Bob"));
    }
}
