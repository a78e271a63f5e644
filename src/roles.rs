//! Role registry.
//!
//! Single source of truth for who may do what. Every guarded vault
//! operation goes through [`RoleRegistry::authorize`].
//!
//! The registry does not stop the last Administrator from revoking itself.
//! Keeping at least one Administrator is the deployer's responsibility.

use crate::error::{VaultError, VaultResult};
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Permissions an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates, approves and executes proposals.
    QuorumMember,
    /// Holds the emergency withdrawal bypass.
    Guardian,
    /// Grants and revokes roles.
    Administrator,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::QuorumMember => "quorum_member",
            Role::Guardian => "guardian",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity -> held roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRegistry {
    roles: HashMap<Identity, BTreeSet<Role>>,
}

impl RoleRegistry {
    /// Bootstrap a registry with its first Administrator.
    pub fn with_administrator(admin: Identity) -> Self {
        let mut registry = Self::default();
        registry
            .roles
            .entry(admin)
            .or_default()
            .insert(Role::Administrator);
        registry
    }

    /// Fail with `Unauthorized` unless `identity` holds `role`.
    pub fn authorize(&self, identity: &Identity, role: Role) -> VaultResult<()> {
        if self.has(role, identity) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                identity: *identity,
                role,
            })
        }
    }

    /// Grant `role` to `identity`. Granting a held role is a no-op.
    ///
    /// Returns whether the registry changed.
    pub fn grant(&mut self, caller: &Identity, role: Role, identity: Identity) -> VaultResult<bool> {
        self.authorize(caller, Role::Administrator)?;
        Ok(self.roles.entry(identity).or_default().insert(role))
    }

    /// Revoke `role` from `identity`. Revoking from a non-holder is a no-op.
    ///
    /// Returns whether the registry changed.
    pub fn revoke(&mut self, caller: &Identity, role: Role, identity: &Identity) -> VaultResult<bool> {
        self.authorize(caller, Role::Administrator)?;
        Ok(self.remove(role, identity))
    }

    pub fn has(&self, role: Role, identity: &Identity) -> bool {
        self.roles
            .get(identity)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Roles held by `identity`, in declaration order.
    pub fn roles_of(&self, identity: &Identity) -> Vec<Role> {
        self.roles
            .get(identity)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Identities holding `role`, sorted.
    pub fn holders(&self, role: Role) -> Vec<Identity> {
        let mut holders: Vec<Identity> = self
            .roles
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(identity, _)| *identity)
            .collect();
        holders.sort();
        holders
    }

    /// Strip every role from `identity` without a caller check.
    ///
    /// Only reachable through a quorum-executed emergency action.
    pub(crate) fn revoke_all(&mut self, identity: &Identity) -> Vec<Role> {
        self.roles
            .remove(identity)
            .map(|roles| roles.into_iter().collect())
            .unwrap_or_default()
    }

    fn remove(&mut self, role: Role, identity: &Identity) -> bool {
        let Some(roles) = self.roles.get_mut(identity) else {
            return false;
        };
        let removed = roles.remove(&role);
        if roles.is_empty() {
            self.roles.remove(identity);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn admin() -> Identity {
        Identity::from_label("admin")
    }

    fn alice() -> Identity {
        Identity::from_label("alice")
    }

    #[test]
    fn test_bootstrap_administrator() {
        let registry = RoleRegistry::with_administrator(admin());
        assert!(registry.has(Role::Administrator, &admin()));
        assert!(!registry.has(Role::QuorumMember, &admin()));
        assert_eq!(registry.holders(Role::Administrator), vec![admin()]);
    }

    #[test]
    fn test_grant_requires_administrator() {
        let mut registry = RoleRegistry::with_administrator(admin());
        let err = registry
            .grant(&alice(), Role::QuorumMember, alice())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!registry.has(Role::QuorumMember, &alice()));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let mut registry = RoleRegistry::with_administrator(admin());
        assert!(registry.grant(&admin(), Role::QuorumMember, alice()).unwrap());
        assert!(!registry.grant(&admin(), Role::QuorumMember, alice()).unwrap());

        assert!(registry.has(Role::QuorumMember, &alice()));
        assert_eq!(registry.roles_of(&alice()), vec![Role::QuorumMember]);
        assert_eq!(registry.holders(Role::QuorumMember), vec![alice()]);
    }

    #[test]
    fn test_revoke_is_idempotent_on_non_holders() {
        let mut registry = RoleRegistry::with_administrator(admin());
        assert!(!registry.revoke(&admin(), Role::Guardian, &alice()).unwrap());

        registry.grant(&admin(), Role::Guardian, alice()).unwrap();
        assert!(registry.revoke(&admin(), Role::Guardian, &alice()).unwrap());
        assert!(!registry.has(Role::Guardian, &alice()));
        assert!(registry.roles_of(&alice()).is_empty());
    }

    #[test]
    fn test_revoke_requires_administrator() {
        let mut registry = RoleRegistry::with_administrator(admin());
        registry.grant(&admin(), Role::Guardian, alice()).unwrap();

        let err = registry
            .revoke(&alice(), Role::Guardian, &alice())
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::Unauthorized {
                role: Role::Administrator,
                ..
            }
        ));
        assert!(registry.has(Role::Guardian, &alice()));
    }

    #[test]
    fn test_authorize_reports_missing_role() {
        let registry = RoleRegistry::with_administrator(admin());
        let err = registry.authorize(&alice(), Role::Guardian).unwrap_err();
        assert_eq!(
            err,
            VaultError::Unauthorized {
                identity: alice(),
                role: Role::Guardian
            }
        );
        assert!(registry.authorize(&admin(), Role::Administrator).is_ok());
    }

    #[test]
    fn test_revoke_all() {
        let mut registry = RoleRegistry::with_administrator(admin());
        registry.grant(&admin(), Role::QuorumMember, alice()).unwrap();
        registry.grant(&admin(), Role::Guardian, alice()).unwrap();

        let removed = registry.revoke_all(&alice());
        assert_eq!(removed, vec![Role::QuorumMember, Role::Guardian]);
        assert!(registry.roles_of(&alice()).is_empty());
        assert!(registry.revoke_all(&alice()).is_empty());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::QuorumMember.to_string(), "quorum_member");
        assert_eq!(Role::Administrator.name(), "administrator");
    }
}
