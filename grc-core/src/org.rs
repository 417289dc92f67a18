//! Organization selection store.
//!
//! Owns the current (tenant, workspace) selection, restores it from a
//! [`DurableStore`] on startup and writes both ids back on every change.
//! Nothing here fails towards the caller: read errors fall back to catalog
//! defaults and write errors leave the in-memory selection updated.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::bail_grc;
use crate::catalog::Catalog;
use crate::errors::{GrcError, GrcResult};
use crate::events::{
    parse_event_pattern, EventPat, ListenerId, SelectionEvent, SelectionEventKind, SelectionHub,
};
use crate::storage::{DurableStore, StoreResult, TENANT_KEY, WORKSPACE_KEY};
use crate::tenant::{Selection, Tenant, User, Workspace};

/// How `select_workspace` treats a workspace the current tenant does not own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkspacePolicy {
    /// Accept it and log a warning.
    #[default]
    Permissive,
    /// Reject it and keep the current workspace.
    Strict,
}

impl WorkspacePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

pub struct OrgStore {
    catalog: Catalog,
    durable: Arc<dyn DurableStore>,
    user: User,
    policy: WorkspacePolicy,
    selection: RwLock<Selection>,
    events: RwLock<SelectionHub>,
    dispatch: Mutex<Dispatch>,
}

/// Events raised while listeners are running wait here for the outermost
/// emit, so every listener sees them in the order the writes happened.
#[derive(Debug, Default)]
struct Dispatch {
    active: bool,
    pending: VecDeque<SelectionEventKind>,
}

impl fmt::Debug for OrgStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrgStore")
            .field("tenants", &self.catalog.len())
            .field("user", &self.user.id)
            .field("policy", &self.policy)
            .field("selection", &*self.selection.read())
            .finish()
    }
}

impl OrgStore {
    /// Build the store and restore the last selection. Never fails.
    pub fn initialize(catalog: Catalog, durable: Arc<dyn DurableStore>, user: User) -> Self {
        let selection = restore_selection(&catalog, durable.as_ref());
        info!(
            "Organization context initialized: tenant={:?} workspace={:?}",
            selection.tenant_id().map(|id| id.as_str()),
            selection.workspace_id().map(|id| id.as_str())
        );

        Self {
            catalog,
            durable,
            user,
            policy: WorkspacePolicy::default(),
            selection: RwLock::new(selection),
            events: RwLock::new(SelectionHub::new()),
            dispatch: Mutex::new(Dispatch::default()),
        }
    }

    pub fn with_policy(mut self, policy: WorkspacePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the restoration again against the same catalog and store.
    pub fn reinitialize(&self) {
        let next = restore_selection(&self.catalog, self.durable.as_ref());
        if self.replace_selection(next) {
            self.emit(SelectionEventKind::Initialized);
        }
    }

    /// Select `tenant` and reset the workspace to its first one.
    ///
    /// The caller is trusted to pass a catalog entry; anything else is
    /// accepted with a warning.
    pub fn select_tenant(&self, tenant: &Tenant) {
        if !self.catalog.contains(tenant) {
            warn!("Selecting tenant {} which is not in the catalog", tenant.id);
        }

        let next = Selection::for_tenant(tenant);
        let workspace_id = next
            .workspace_id()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();

        let previous_tenant = self.selection.read().tenant_id().cloned();
        let changed = self.replace_selection(next);

        self.persist(TENANT_KEY, tenant.id.as_str());
        self.persist(WORKSPACE_KEY, &workspace_id);

        if changed {
            let kind = if previous_tenant.as_ref() == Some(&tenant.id) {
                SelectionEventKind::WorkspaceChanged
            } else {
                SelectionEventKind::TenantChanged
            };
            self.emit(kind);
        }
    }

    /// Select `workspace` under the store's [`WorkspacePolicy`].
    ///
    /// Permissive mode does not check that the current tenant owns it.
    pub fn select_workspace(&self, workspace: &Workspace) {
        if self.policy == WorkspacePolicy::Strict {
            if let Err(e) = self.try_select_workspace(workspace) {
                warn!("Rejected workspace {}: {}", workspace.id, e);
            }
            return;
        }

        if let Some(tenant) = self.current_tenant() {
            if !tenant.owns(workspace) {
                warn!(
                    "Workspace {} is not owned by current tenant {}",
                    workspace.id, tenant.id
                );
            }
        }

        let changed = {
            let mut selection = self.selection.write();
            if selection.workspace.as_ref() == Some(workspace) {
                false
            } else {
                selection.workspace = Some(workspace.clone());
                true
            }
        };

        self.persist(WORKSPACE_KEY, workspace.id.as_str());
        if changed {
            self.emit(SelectionEventKind::WorkspaceChanged);
        }
    }

    /// Like [`OrgStore::select_workspace`], but only for a workspace the
    /// current tenant owns. The catalog's copy of the workspace is stored.
    pub fn try_select_workspace(&self, workspace: &Workspace) -> GrcResult<()> {
        let changed = {
            let mut selection = self.selection.write();
            let Some(tenant) = selection.tenant.as_ref() else {
                bail_grc!(not_found, "no tenant selected for workspace {}", workspace.id);
            };
            let Some(owned) = tenant.workspace(workspace.id.as_str()).cloned() else {
                return Err(GrcError::conflict(format!(
                    "workspace {} does not belong to tenant {}",
                    workspace.id, tenant.id
                ))
                .with_data(serde_json::json!({
                    "tenant": tenant.id,
                    "workspace": workspace.id,
                }))
                .into_anyhow());
            };
            if selection.workspace.as_ref() == Some(&owned) {
                false
            } else {
                selection.workspace = Some(owned);
                true
            }
        };

        self.persist(WORKSPACE_KEY, workspace.id.as_str());
        if changed {
            self.emit(SelectionEventKind::WorkspaceChanged);
        }
        Ok(())
    }

    /// Switching users is not supported. The call is accepted and ignored.
    pub fn select_user(&self, user: &User) {
        info!(
            "Switching users is not supported; ignoring request for {} and keeping {}",
            user.id, self.user.id
        );
    }

    pub fn current_tenant(&self) -> Option<Tenant> {
        self.selection.read().tenant.clone()
    }

    pub fn current_workspace(&self) -> Option<Workspace> {
        self.selection.read().workspace.clone()
    }

    pub fn current_user(&self) -> &User {
        &self.user
    }

    pub fn selection(&self) -> Selection {
        self.selection.read().clone()
    }

    pub fn tenants(&self) -> &[Tenant] {
        self.catalog.tenants()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> WorkspacePolicy {
        self.policy
    }

    pub fn durable_store(&self) -> &Arc<dyn DurableStore> {
        &self.durable
    }

    pub fn subscribe<F>(&self, pattern: EventPat, listener: F) -> ListenerId
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        self.events.write().on(pattern, Arc::new(listener))
    }

    pub fn subscribe_once<F>(&self, pattern: EventPat, listener: F) -> ListenerId
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        self.events.write().once(pattern, Arc::new(listener))
    }

    /// store.subscribe_str("tenant.changed", |e| ...)
    pub fn subscribe_str<F>(&self, pattern: &str, listener: F) -> anyhow::Result<ListenerId>
    where
        F: Fn(&SelectionEvent) + Send + Sync + 'static,
    {
        let pattern = parse_event_pattern(pattern)?;
        Ok(self.subscribe(pattern, listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.write().off(id)
    }

    fn replace_selection(&self, next: Selection) -> bool {
        let mut current = self.selection.write();
        if *current == next {
            return false;
        }
        *current = next;
        true
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.durable.set(key, value) {
            warn!("Failed to persist {}={:?}, keeping in-memory selection: {}", key, value, e);
        }
    }

    /// Listeners run with no lock held, so they may call back into the
    /// store. A setter called from a listener queues its event behind the
    /// one being delivered, and each listener gets the selection as it is
    /// when the listener is called.
    fn emit(&self, kind: SelectionEventKind) {
        {
            let mut dispatch = self.dispatch.lock();
            dispatch.pending.push_back(kind);
            if dispatch.active {
                return;
            }
            dispatch.active = true;
        }

        loop {
            let next = {
                let mut dispatch = self.dispatch.lock();
                let next = dispatch.pending.pop_front();
                if next.is_none() {
                    dispatch.active = false;
                }
                next
            };
            let Some(kind) = next else {
                break;
            };

            let listeners = self.events.write().take_listeners(kind);
            debug!("Emitting {} to {} listener(s)", kind.as_str(), listeners.len());
            for f in &listeners {
                let event = SelectionEvent {
                    kind,
                    selection: self.selection(),
                };
                f(&event);
            }
        }
    }
}

/// Persisted selection if it still resolves against the catalog, otherwise
/// the catalog default. Read failures are logged and treated as "nothing
/// persisted".
fn restore_selection(catalog: &Catalog, durable: &dyn DurableStore) -> Selection {
    match read_persisted(catalog, durable) {
        Ok(Some(selection)) => selection,
        Ok(None) => default_selection(catalog),
        Err(e) => {
            warn!("Failed to read persisted selection, using catalog defaults: {}", e);
            default_selection(catalog)
        }
    }
}

fn read_persisted(catalog: &Catalog, durable: &dyn DurableStore) -> StoreResult<Option<Selection>> {
    let Some(tenant_id) = durable.get(TENANT_KEY)? else {
        return Ok(None);
    };
    let Some(tenant) = catalog.find_tenant(&tenant_id) else {
        debug!("Persisted tenant {} is no longer in the catalog", tenant_id);
        return Ok(None);
    };

    let persisted_ws = durable.get(WORKSPACE_KEY)?;
    let workspace = match persisted_ws.as_deref().and_then(|id| tenant.workspace(id)) {
        Some(ws) => Some(ws.clone()),
        None => {
            if let Some(id) = persisted_ws.as_deref().filter(|id| !id.is_empty()) {
                debug!("Persisted workspace {} is not owned by tenant {}", id, tenant.id);
            }
            tenant.default_workspace().cloned()
        }
    };

    Ok(Some(Selection {
        tenant: Some(tenant.clone()),
        workspace,
    }))
}

fn default_selection(catalog: &Catalog) -> Selection {
    catalog.first().map(Selection::for_tenant).unwrap_or_default()
}
