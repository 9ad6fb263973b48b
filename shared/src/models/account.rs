//! User accounts, role groups and per-request role resolution
//!
//! Roles are not stored on the account. They are derived from three facts
//! probed once per request: whether a producer profile exists, the superuser
//! flag, and group membership / warehouse assignments. [`Session`] holds the
//! result so handlers never re-query it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Role groups a user can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Producers,
    Managers,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown group: {0}")]
pub struct UnknownGroup(pub String);

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Producers => "producers",
            Group::Managers => "managers",
        }
    }
}

impl std::str::FromStr for Group {
    type Err = UnknownGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producers" => Ok(Group::Producers),
            "managers" => Ok(Group::Managers),
            other => Err(UnknownGroup(other.to_string())),
        }
    }
}

impl TryFrom<String> for Group {
    type Error = UnknownGroup;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Capabilities checked by `Session::has_role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A producer profile is linked to the account
    Producer,
    /// Member of the managers group
    Manager,
    SuperAdmin,
}

/// Who is calling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub is_superuser: bool,
}

impl Identity {
    /// Display name with the account identifier as fallback
    pub fn display_name(&self) -> String {
        super::operator_name(&self.full_name, &self.username)
    }
}

/// Raw facts about a user, gathered from the database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleProbe {
    pub producer_id: Option<Uuid>,
    pub is_superuser: bool,
    pub in_managers_group: bool,
    pub managed_warehouse_count: i64,
}

/// Which dashboard a user gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardRole {
    Producer { producer_id: Uuid },
    SuperAdmin,
    Manager,
    Unassigned,
}

impl DashboardRole {
    /// Producer profile first, then superuser, then warehouse assignment.
    /// A superuser who also manages a warehouse gets the super-admin view.
    pub fn resolve(probe: &RoleProbe) -> Self {
        if let Some(producer_id) = probe.producer_id {
            DashboardRole::Producer { producer_id }
        } else if probe.is_superuser {
            DashboardRole::SuperAdmin
        } else if probe.managed_warehouse_count > 0 {
            DashboardRole::Manager
        } else {
            DashboardRole::Unassigned
        }
    }
}

/// Which warehouses a user may see through the stock views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "manager_id", rename_all = "snake_case")]
pub enum WarehouseScope {
    All,
    Managed(Uuid),
    Denied,
}

impl WarehouseScope {
    pub fn for_probe(user_id: Uuid, probe: &RoleProbe) -> Self {
        if probe.is_superuser {
            WarehouseScope::All
        } else if probe.in_managers_group {
            WarehouseScope::Managed(user_id)
        } else {
            WarehouseScope::Denied
        }
    }

    /// Whether a warehouse with the given manager is visible in this scope
    pub fn permits(&self, warehouse_manager: Option<Uuid>) -> bool {
        match self {
            WarehouseScope::All => true,
            WarehouseScope::Managed(user_id) => warehouse_manager == Some(*user_id),
            WarehouseScope::Denied => false,
        }
    }

    /// Manager filter to apply to queries; `None` means unrestricted
    pub fn manager_filter(&self) -> Option<Uuid> {
        match self {
            WarehouseScope::Managed(user_id) => Some(*user_id),
            _ => None,
        }
    }
}

/// Role flags sent alongside every dashboard payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleFlags {
    pub is_producer: bool,
    pub is_superuser: bool,
    pub is_manager: bool,
}

/// Resolved caller for one request
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    probe: RoleProbe,
}

impl Session {
    /// The probe is read from the database on every request, so its superuser
    /// flag overrides whatever the token carried
    pub fn new(identity: Identity, probe: RoleProbe) -> Self {
        let identity = Identity {
            is_superuser: probe.is_superuser,
            ..identity
        };
        Self { identity, probe }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.user_id
    }

    pub fn producer_id(&self) -> Option<Uuid> {
        self.probe.producer_id
    }

    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Producer => self.probe.producer_id.is_some(),
            Role::Manager => self.probe.in_managers_group,
            Role::SuperAdmin => self.probe.is_superuser,
        }
    }

    pub fn dashboard_role(&self) -> DashboardRole {
        DashboardRole::resolve(&self.probe)
    }

    pub fn warehouse_scope(&self) -> WarehouseScope {
        WarehouseScope::for_probe(self.identity.user_id, &self.probe)
    }

    pub fn role_flags(&self) -> RoleFlags {
        RoleFlags {
            is_producer: self.probe.producer_id.is_some(),
            is_superuser: self.probe.is_superuser,
            is_manager: self.probe.managed_warehouse_count > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(is_superuser: bool) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "gest1".to_string(),
            full_name: String::new(),
            is_superuser,
        }
    }

    #[test]
    fn test_superuser_with_warehouse_gets_admin_view() {
        let probe = RoleProbe {
            producer_id: None,
            is_superuser: true,
            in_managers_group: true,
            managed_warehouse_count: 2,
        };
        assert_eq!(DashboardRole::resolve(&probe), DashboardRole::SuperAdmin);
    }

    #[test]
    fn test_producer_profile_wins() {
        let producer_id = Uuid::new_v4();
        let probe = RoleProbe {
            producer_id: Some(producer_id),
            is_superuser: true,
            ..Default::default()
        };
        assert_eq!(DashboardRole::resolve(&probe), DashboardRole::Producer { producer_id });
    }

    #[test]
    fn test_manager_requires_assignment() {
        let mut probe = RoleProbe {
            in_managers_group: true,
            ..Default::default()
        };
        assert_eq!(DashboardRole::resolve(&probe), DashboardRole::Unassigned);
        probe.managed_warehouse_count = 1;
        assert_eq!(DashboardRole::resolve(&probe), DashboardRole::Manager);
    }

    #[test]
    fn test_scope_isolates_managers() {
        let manager_a = Uuid::new_v4();
        let manager_b = Uuid::new_v4();
        let probe = RoleProbe {
            in_managers_group: true,
            ..Default::default()
        };
        let scope = WarehouseScope::for_probe(manager_a, &probe);
        assert!(scope.permits(Some(manager_a)));
        assert!(!scope.permits(Some(manager_b)));
        assert!(!scope.permits(None));
    }

    #[test]
    fn test_gate_denies_plain_users() {
        let scope = WarehouseScope::for_probe(Uuid::new_v4(), &RoleProbe::default());
        assert_eq!(scope, WarehouseScope::Denied);
        assert!(!scope.permits(None));
    }

    #[test]
    fn test_session_roles() {
        let probe = RoleProbe {
            is_superuser: true,
            ..Default::default()
        };
        let session = Session::new(identity(true), probe);
        assert!(session.has_role(Role::SuperAdmin));
        assert!(!session.has_role(Role::Manager));
        assert!(!session.has_role(Role::Producer));
        assert_eq!(session.warehouse_scope(), WarehouseScope::All);
        assert_eq!(session.dashboard_role(), DashboardRole::SuperAdmin);
        assert_eq!(session.identity().display_name(), "gest1");
    }

    #[test]
    fn test_stale_superuser_claim_is_ignored() {
        let session = Session::new(identity(true), RoleProbe::default());
        assert!(!session.identity().is_superuser);
        assert!(!session.has_role(Role::SuperAdmin));
        assert!(!session.role_flags().is_superuser);
        assert_eq!(session.warehouse_scope(), WarehouseScope::Denied);
        assert_eq!(session.dashboard_role(), DashboardRole::Unassigned);

        let promoted = RoleProbe {
            is_superuser: true,
            ..Default::default()
        };
        let session = Session::new(identity(false), promoted);
        assert!(session.identity().is_superuser);
        assert!(session.has_role(Role::SuperAdmin));
        assert!(session.role_flags().is_superuser);
    }
}
