//! Static tenant catalog.
//!
//! Loaded once at startup and never mutated afterwards.

use std::collections::HashSet;

use crate::errors::{GrcError, GrcResult};
use crate::tenant::{Tenant, TenantId, User, Workspace, WorkspaceId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tenants: Vec<Tenant>,
}

impl Catalog {
    /// Trusts the caller on id uniqueness. See [`Catalog::try_new`].
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }

    pub fn try_new(tenants: Vec<Tenant>) -> GrcResult<Self> {
        let catalog = Self::new(tenants);
        catalog.validate()?;
        Ok(catalog)
    }

    /// Tenant ids must be unique, and workspace ids unique within a tenant.
    pub fn validate(&self) -> GrcResult<()> {
        let mut seen = HashSet::new();
        for tenant in &self.tenants {
            if !seen.insert(tenant.id.as_str()) {
                return Err(GrcError::conflict(format!("duplicate tenant id '{}'", tenant.id)).into_anyhow());
            }
            let mut ws_seen = HashSet::new();
            for ws in &tenant.workspaces {
                if !ws_seen.insert(ws.id.as_str()) {
                    return Err(GrcError::conflict(format!(
                        "duplicate workspace id '{}' in tenant '{}'",
                        ws.id, tenant.id
                    ))
                    .into_anyhow());
                }
            }
        }
        Ok(())
    }

    pub fn tenants(&self) -> &[Tenant] {
        &self.tenants
    }

    pub fn first(&self) -> Option<&Tenant> {
        self.tenants.first()
    }

    pub fn tenant(&self, id: &TenantId) -> Option<&Tenant> {
        self.find_tenant(id.as_str())
    }

    pub fn find_tenant(&self, id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id.as_str() == id)
    }

    /// First tenant owning a workspace with this id.
    pub fn owner_of(&self, id: &WorkspaceId) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.workspace(id.as_str()).is_some())
    }

    pub fn contains(&self, tenant: &Tenant) -> bool {
        self.tenant(&tenant.id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl From<Vec<Tenant>> for Catalog {
    fn from(tenants: Vec<Tenant>) -> Self {
        Self::new(tenants)
    }
}

/// Demo organizations shipped with the dashboard.
pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Tenant::new("northwind", "Northwind Holdings", "building-2")
            .with_workspace(
                Workspace::new("corp-it", "Corporate IT").with_description("SOC 2 and ISO 27001 scope"),
            )
            .with_workspace(
                Workspace::new("eu-ops", "EU Operations").with_description("GDPR processing activities"),
            )
            .with_workspace(
                Workspace::new("payments", "Payments").with_description("PCI DSS cardholder environment"),
            ),
        Tenant::new("contoso-health", "Contoso Health", "heart-pulse")
            .with_workspace(
                Workspace::new("clinical", "Clinical Systems").with_description("HIPAA covered systems"),
            )
            .with_workspace(Workspace::new("research", "Research")),
        Tenant::new("fabrikam", "Fabrikam Labs", "flask-conical")
            .with_workspace(Workspace::new("engineering", "Engineering")),
    ])
}

/// The single signed-in user of the dashboard.
pub fn sample_user() -> User {
    User::new("u-1001", "Jordan Avery", "jordan.avery@northwind.example").with_avatar("/avatars/jordan.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn sample_catalog_is_valid() {
        let catalog = sample_catalog();
        catalog.validate().unwrap();
        assert_eq!(catalog.first().map(|t| t.id.as_str()), Some("northwind"));
        assert!(catalog.tenants().iter().all(|t| !t.workspaces.is_empty()));
    }

    #[test]
    fn lookups() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.find_tenant("fabrikam").map(|t| t.name.as_str()),
            Some("Fabrikam Labs")
        );
        assert!(catalog.find_tenant("initech").is_none());
        assert_eq!(
            catalog.owner_of(&WorkspaceId::from("research")).map(|t| t.id.as_str()),
            Some("contoso-health")
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dup_tenant = Catalog::try_new(vec![
            Tenant::new("a", "A", "x"),
            Tenant::new("a", "A again", "x"),
        ])
        .unwrap_err();
        assert_eq!(GrcError::from_anyhow(&dup_tenant).unwrap().kind, ErrorKind::Conflict);

        let dup_ws = Catalog::try_new(vec![Tenant::new("a", "A", "x")
            .with_workspace(Workspace::new("w", "W"))
            .with_workspace(Workspace::new("w", "W2"))])
        .unwrap_err();
        assert!(dup_ws.to_string().contains("duplicate workspace id 'w'"));

        // the same workspace id under two tenants is fine
        Catalog::try_new(vec![
            Tenant::new("a", "A", "x").with_workspace(Workspace::new("w", "W")),
            Tenant::new("b", "B", "x").with_workspace(Workspace::new("w", "W")),
        ])
        .unwrap();
    }
}
