//! Core multi-tenant types for the dashboard.
//!
//! A tenant owns an ordered list of workspaces. The first workspace is the
//! tenant's default and is what a fresh tenant selection lands on.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Tenant identifier, unique across the catalog.
    TenantId
);
string_id!(
    /// Workspace identifier, unique within its owning tenant.
    WorkspaceId
);
string_id!(UserId);

/// A named sub-division of a tenant (team, region, business unit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Workspace {
    pub fn new(id: impl Into<WorkspaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Top-level organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub icon: String,
    pub workspaces: Vec<Workspace>,
}

impl Tenant {
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            workspaces: Vec::new(),
        }
    }

    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspaces.push(workspace);
        self
    }

    /// The workspace a fresh selection of this tenant lands on.
    pub fn default_workspace(&self) -> Option<&Workspace> {
        self.workspaces.first()
    }

    pub fn workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id.as_str() == id)
    }

    /// Ownership is by id: workspace ids are only unique within a tenant.
    pub fn owns(&self, workspace: &Workspace) -> bool {
        self.workspace(workspace.id.as_str()).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// The current (tenant, workspace) pair.
///
/// Transient: only the two ids are persisted, the rest is rebuilt from the
/// catalog on startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub tenant: Option<Tenant>,
    pub workspace: Option<Workspace>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Select `tenant` together with its default workspace.
    pub fn for_tenant(tenant: &Tenant) -> Self {
        Self {
            tenant: Some(tenant.clone()),
            workspace: tenant.default_workspace().cloned(),
        }
    }

    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant.as_ref().map(|t| &t.id)
    }

    pub fn workspace_id(&self) -> Option<&WorkspaceId> {
        self.workspace.as_ref().map(|w| &w.id)
    }

    /// A selected tenant implies a selected workspace it owns, unless the
    /// tenant has no workspaces at all.
    pub fn is_consistent(&self) -> bool {
        match (&self.tenant, &self.workspace) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(t), None) => t.workspaces.is_empty(),
            (Some(t), Some(w)) => t.owns(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Tenant {
        Tenant::new("acme", "Acme", "building")
            .with_workspace(Workspace::new("prod", "Production"))
            .with_workspace(Workspace::new("eu", "EU Region").with_description("GDPR scope"))
    }

    #[test]
    fn default_workspace_is_first() {
        let tenant = acme();
        assert_eq!(tenant.default_workspace().map(|w| w.id.as_str()), Some("prod"));
        assert!(Tenant::new("empty", "Empty", "x").default_workspace().is_none());
    }

    #[test]
    fn ownership_is_by_id() {
        let tenant = acme();
        assert!(tenant.owns(&Workspace::new("eu", "renamed")));
        assert!(!tenant.owns(&Workspace::new("apac", "APAC")));
    }

    #[test]
    fn selection_consistency() {
        let tenant = acme();
        assert!(Selection::empty().is_consistent());
        assert!(Selection::for_tenant(&tenant).is_consistent());

        let orphan = Selection {
            tenant: Some(tenant.clone()),
            workspace: Some(Workspace::new("apac", "APAC")),
        };
        assert!(!orphan.is_consistent());

        let missing = Selection {
            tenant: Some(tenant),
            workspace: None,
        };
        assert!(!missing.is_consistent());

        let bare = Tenant::new("bare", "Bare", "x");
        assert!(Selection::for_tenant(&bare).is_consistent());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_value(Workspace::new("prod", "Production")).unwrap();
        assert_eq!(json["id"], "prod");
        assert!(json.get("description").is_none());
    }
}
