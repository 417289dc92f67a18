//! # Configuration
//!
//! A minimal string key/value store, layered by the application shell.
//!
//! ```rust
//! use grc_core::GrcConfig;
//! let mut config = GrcConfig::new();
//!
//! config.set("storage.kind", "file");
//! config.set("storage.path", "/tmp/grc-selection.json");
//!
//! assert_eq!(config.get("storage.kind"), Some("file"));
//! ```
//!
//! ## Environment overrides
//! [`GrcConfig::load_env`] maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export GRC__STORAGE__PATH=/var/lib/grc/selection.json   # storage.path
//! export GRC__SELECTION__POLICY=strict                    # selection.policy
//! ```
//!
//! ## Recognized keys
//! - `storage.kind`: `memory` or `file`
//! - `storage.path`: location of the file-backed durable store
//! - `selection.policy`: `permissive` (default) or `strict`
//! - `select.tenant` / `select.workspace`: startup selection overrides

use std::collections::HashMap;

pub const ENV_PREFIX: &str = "GRC__";

#[derive(Debug, Default)]
pub struct GrcConfig {
    values: HashMap<String, String>,
}

impl GrcConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Returns None if the key is not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every `{prefix}A__B=value` variable into `a.b`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    pub(crate) fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> GrcConfigSnapshot {
        GrcConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrcConfigSnapshot {
    map: HashMap<String, String>,
}

impl GrcConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_map_to_dotted_keys() {
        let mut config = GrcConfig::new();
        config.load_vars(
            ENV_PREFIX,
            vec![
                ("GRC__STORAGE__PATH".to_string(), "/tmp/sel.json".to_string()),
                ("GRC__SELECTION__POLICY".to_string(), "strict".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ],
        );

        assert_eq!(config.get("storage.path"), Some("/tmp/sel.json"));
        assert_eq!(config.get("selection.policy"), Some("strict"));
        assert!(!config.has("home"));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut config = GrcConfig::new();
        config.set("storage.kind", "memory");
        let snap = config.snapshot();
        config.set("storage.kind", "file");

        assert_eq!(snap.get("storage.kind"), Some("memory"));
        assert_eq!(config.get("storage.kind"), Some("file"));
    }

    #[test]
    fn typed_reads() {
        let mut config = GrcConfig::new();
        config.set("a", "12");
        config.set("b", "true");
        config.set("c", "nope");
        let snap = config.snapshot();

        assert_eq!(snap.get_usize("a"), Some(12));
        assert_eq!(snap.get_bool("b"), Some(true));
        assert_eq!(snap.get_bool("c"), None);
        assert_eq!(snap.get_string("missing"), None);
    }
}
