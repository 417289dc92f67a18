//! grc-core: organization context for the GRC dashboard.
//!
//! Holds the tenant catalog, the current tenant/workspace selection and the
//! durable key/value store the selection is restored from.

pub mod app;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod events;
pub mod org;
pub mod storage;
pub mod tenant;

pub use app::GrcApp;
pub use catalog::{sample_catalog, sample_user, Catalog};
pub use config::{GrcConfig, GrcConfigSnapshot};
pub use errors::{ErrorKind, GrcError, GrcResult};
pub use events::{
    parse_event_pattern, EventPat, ListenerId, SelectionEvent, SelectionEventKind, SelectionHub,
    SelectionListener,
};
pub use org::{OrgStore, WorkspacePolicy};
pub use storage::{
    DurableStore, FileStore, MemoryStore, StoreCapabilities, StoreError, StoreResult, TENANT_KEY,
    WORKSPACE_KEY,
};
pub use tenant::{Selection, Tenant, TenantId, User, UserId, Workspace, WorkspaceId};
