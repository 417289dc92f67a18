use anyhow::Result;
use grc_core::config::ENV_PREFIX;
use grc_core::{
    sample_catalog, sample_user, EventPat, GrcApp, GrcConfig, GrcError, Selection, Tenant, User,
    Workspace,
};
use serde::Serialize;
use tracing::info;

/// Dashboard defaults, before `GRC__*` overrides.
pub fn default_config() -> GrcConfig {
    let mut config = GrcConfig::new();
    config.set("storage.kind", "file");
    config.set("storage.path", ".grc/selection.json");
    config.set("selection.policy", "permissive");
    config
}

/// Defaults layered with the process environment.
pub fn build() -> Result<GrcApp> {
    let mut config = default_config();
    config.load_env(ENV_PREFIX);
    build_with(config)
}

pub fn build_with(config: GrcConfig) -> Result<GrcApp> {
    let app = GrcApp::from_config(config, sample_catalog(), sample_user())?;

    app.org().subscribe(EventPat::Any, |event| {
        info!(
            "[org] {} tenant={:?} workspace={:?}",
            event.kind.as_str(),
            event.selection.tenant_id().map(|id| id.as_str()),
            event.selection.workspace_id().map(|id| id.as_str())
        );
    });

    apply_startup_selection(&app)?;
    Ok(app)
}

/// `select.tenant` / `select.workspace` pick a selection at startup, as if
/// the user had clicked through the switcher.
fn apply_startup_selection(app: &GrcApp) -> Result<()> {
    let org = app.org();

    if let Some(id) = app.get("select.tenant") {
        let tenant = org
            .catalog()
            .find_tenant(&id)
            .cloned()
            .ok_or_else(|| GrcError::not_found(format!("unknown tenant '{id}'")).into_anyhow())?;
        org.select_tenant(&tenant);
    }

    if let Some(id) = app.get("select.workspace") {
        org.try_select_workspace(&Workspace::new(id.as_str(), id.as_str()))?;
    }

    Ok(())
}

/// What the organization switcher renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub user: User,
    pub tenants: Vec<Tenant>,
    pub selection: Selection,
    pub durable_storage: bool,
}

impl DashboardView {
    pub fn from_app(app: &GrcApp) -> Self {
        let org = app.org();
        Self {
            user: org.current_user().clone(),
            tenants: org.tenants().to_vec(),
            selection: org.selection(),
            durable_storage: org.durable_store().capabilities().durable,
        }
    }
}
