use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::bail_grc;
use crate::catalog::Catalog;
use crate::config::{GrcConfig, GrcConfigSnapshot};
use crate::errors::{GrcError, GrcResult};
use crate::org::{OrgStore, WorkspacePolicy};
use crate::storage::{DurableStore, FileStore, MemoryStore};
use crate::tenant::User;

#[derive(Debug)]
struct GrcAppInner {
    config: RwLock<GrcConfig>,
    org: OrgStore,
}

/// Application container for the dashboard.
///
/// Constructed once by the shell and handed to whatever needs the
/// organization context. Clones share the same state.
#[derive(Clone, Debug)]
pub struct GrcApp {
    inner: Arc<GrcAppInner>,
}

impl GrcApp {
    pub fn new(catalog: Catalog, durable: Arc<dyn DurableStore>, user: User) -> Self {
        Self::with_store(GrcConfig::new(), OrgStore::initialize(catalog, durable, user))
    }

    /// Build the durable store and selection policy from `config`.
    ///
    /// - `storage.kind`: `memory` (default) or `file`, the latter needing `storage.path`
    /// - `selection.policy`: `permissive` (default) or `strict`
    pub fn from_config(config: GrcConfig, catalog: Catalog, user: User) -> GrcResult<Self> {
        let snapshot = config.snapshot();
        let durable = durable_from_config(&snapshot)?;
        let policy = policy_from_config(&snapshot)?;

        let org = OrgStore::initialize(catalog, durable, user).with_policy(policy);
        Ok(Self::with_store(config, org))
    }

    fn with_store(config: GrcConfig, org: OrgStore) -> Self {
        Self {
            inner: Arc::new(GrcAppInner {
                config: RwLock::new(config),
                org,
            }),
        }
    }

    pub fn org(&self) -> &OrgStore {
        &self.inner.org
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    pub fn config_snapshot(&self) -> GrcConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

pub fn durable_from_config(config: &GrcConfigSnapshot) -> GrcResult<Arc<dyn DurableStore>> {
    match config.get("storage.kind").unwrap_or("memory") {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "file" => {
            let Some(path) = config.get("storage.path") else {
                bail_grc!(bad_request, "storage.kind=file requires storage.path");
            };
            info!("Using file-backed durable store at {}", path);
            Ok(Arc::new(FileStore::new(path)))
        }
        other => Err(GrcError::bad_request(format!("unknown storage.kind '{other}'")).into_anyhow()),
    }
}

pub fn policy_from_config(config: &GrcConfigSnapshot) -> GrcResult<WorkspacePolicy> {
    match config.get("selection.policy") {
        None => Ok(WorkspacePolicy::default()),
        Some(raw) => WorkspacePolicy::parse(raw).ok_or_else(|| {
            GrcError::bad_request(format!("unknown selection.policy '{raw}'")).into_anyhow()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{sample_catalog, sample_user};
    use crate::errors::ErrorKind;

    #[test]
    fn defaults_to_memory_and_permissive() {
        let app = GrcApp::from_config(GrcConfig::new(), sample_catalog(), sample_user()).unwrap();
        assert_eq!(app.org().policy(), WorkspacePolicy::Permissive);
        assert!(!app.org().durable_store().capabilities().durable);
    }

    #[test]
    fn file_kind_needs_a_path() {
        let mut config = GrcConfig::new();
        config.set("storage.kind", "file");
        let err = GrcApp::from_config(config, sample_catalog(), sample_user()).unwrap_err();
        assert_eq!(GrcError::from_anyhow(&err).unwrap().kind, ErrorKind::BadRequest);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let mut config = GrcConfig::new();
        config.set("storage.kind", "indexeddb");
        assert!(GrcApp::from_config(config, sample_catalog(), sample_user()).is_err());

        let mut config = GrcConfig::new();
        config.set("selection.policy", "lenient");
        assert!(GrcApp::from_config(config, sample_catalog(), sample_user()).is_err());
    }

    #[test]
    fn clones_share_state() {
        let app = GrcApp::new(sample_catalog(), Arc::new(MemoryStore::new()), sample_user());
        let other = app.clone();
        let fabrikam = app.org().catalog().find_tenant("fabrikam").unwrap().clone();

        app.org().select_tenant(&fabrikam);
        other.set("storage.kind", "memory");

        assert_eq!(other.org().current_tenant(), Some(fabrikam));
        assert_eq!(app.get("storage.kind").as_deref(), Some("memory"));
        assert_eq!(app.config_snapshot().get("storage.kind"), Some("memory"));
    }

    #[test]
    fn debug_output_names_the_selection() {
        let app = GrcApp::new(sample_catalog(), Arc::new(MemoryStore::new()), sample_user());
        let rendered = format!("{app:?}");
        assert!(rendered.contains("OrgStore"));
        assert!(rendered.contains("northwind"));
    }

    #[test]
    fn strict_policy_from_config() {
        let mut config = GrcConfig::new();
        config.set("selection.policy", "strict");
        let app = GrcApp::from_config(config, sample_catalog(), sample_user()).unwrap();
        assert_eq!(app.org().policy(), WorkspacePolicy::Strict);
    }
}
