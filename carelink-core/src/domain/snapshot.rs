//! The process-wide session snapshot and role assignments.

use serde::{Deserialize, Serialize};

use super::identity::{Identity, SubjectId};
use super::role::Role;

/// Binding of a subject to its registered role.
///
/// Created once at registration time and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    subject_id: SubjectId,
    role: Role,
}

impl RoleAssignment {
    /// Bind a subject to a role.
    pub fn new(subject_id: SubjectId, role: Role) -> Self {
        Self { subject_id, role }
    }

    /// Subject the assignment belongs to.
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Assigned role.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Tri-state view of the current session.
///
/// ## Invariants
/// - `resolving` is true only between process start and the first
///   credential event; it never becomes true again afterwards.
/// - `role` is only ever present alongside `identity`.
///
/// A present identity with an absent role is the valid
/// "authenticated but role not yet provisioned" state, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    identity: Option<Identity>,
    role: Option<RoleAssignment>,
    resolving: bool,
}

impl SessionSnapshot {
    /// Snapshot before the first credential event has arrived.
    pub const fn resolving() -> Self {
        Self {
            identity: None,
            role: None,
            resolving: true,
        }
    }

    /// Snapshot after a sign-out (or an initial signed-out state).
    pub const fn signed_out() -> Self {
        Self {
            identity: None,
            role: None,
            resolving: false,
        }
    }

    /// Snapshot for an authenticated identity and its resolved role, if
    /// one is provisioned.
    pub const fn authenticated(identity: Identity, role: Option<RoleAssignment>) -> Self {
        Self {
            identity: Some(identity),
            role,
            resolving: false,
        }
    }

    /// Whether the first credential event is still outstanding.
    pub const fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Authenticated identity, when present.
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Resolved role assignment, when present.
    pub const fn role_assignment(&self) -> Option<&RoleAssignment> {
        self.role.as_ref()
    }

    /// Resolved role, when present.
    pub fn role(&self) -> Option<Role> {
        self.role.as_ref().map(RoleAssignment::role)
    }

    /// Whether an identity is present.
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::resolving()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn identity() -> Identity {
        Identity::new(
            SubjectId::new("p-1").expect("valid id"),
            Some("a@b.com".to_owned()),
            None,
        )
    }

    #[rstest]
    fn resolving_snapshot_has_no_identity() {
        let snapshot = SessionSnapshot::resolving();
        assert!(snapshot.is_resolving());
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.role(), None);
    }

    #[rstest]
    fn authenticated_snapshot_clears_resolving() {
        let assignment = RoleAssignment::new(SubjectId::new("p-1").expect("valid id"), Role::Patient);
        let snapshot = SessionSnapshot::authenticated(identity(), Some(assignment));
        assert!(!snapshot.is_resolving());
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.role(), Some(Role::Patient));
    }

    #[rstest]
    fn authenticated_without_role_is_valid() {
        let snapshot = SessionSnapshot::authenticated(identity(), None);
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.role(), None);
    }
}
