//! Pure render/redirect decisions for protected views.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use super::role::Role;
use super::snapshot::SessionSnapshot;

/// Validation errors raised when constructing [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationValidationError {
    /// Destination was empty once trimmed.
    #[error("redirect destination must not be empty")]
    Empty,
}

/// Redirect target for a denied view, e.g. `/login/patient`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Destination(String);

impl Destination {
    /// Validate and construct a destination.
    pub fn new(value: impl Into<String>) -> Result<Self, DestinationValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(DestinationValidationError::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the destination as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Outcome of gating a protected view against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The first credential event is still outstanding; render a neutral
    /// loading indicator, no redirect decision yet.
    Pending,
    /// The session satisfies the policy; render the view.
    Allow,
    /// The session does not satisfy the policy; send the caller here.
    Redirect(Destination),
}

/// Access policy supplied per protected view.
///
/// Immutable once built. A policy without a role restriction admits any
/// authenticated identity, including one whose role is not yet
/// provisioned.
///
/// # Examples
/// ```
/// use carelink_core::{AccessDecision, AccessPolicy, Destination, Role, SessionSnapshot};
///
/// let policy = AccessPolicy::for_roles(
///     [Role::Doctor, Role::Nurse],
///     Destination::new("/login/patient").unwrap(),
/// );
/// assert_eq!(
///     policy.evaluate(&SessionSnapshot::signed_out()),
///     AccessDecision::Redirect(Destination::new("/login/patient").unwrap()),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_roles: Option<BTreeSet<Role>>,
    fallback_by_role: BTreeMap<Role, Destination>,
    default_fallback: Destination,
}

impl AccessPolicy {
    /// Policy admitting the given roles only.
    pub fn for_roles(
        allowed_roles: impl IntoIterator<Item = Role>,
        default_fallback: Destination,
    ) -> Self {
        Self {
            allowed_roles: Some(allowed_roles.into_iter().collect()),
            fallback_by_role: BTreeMap::new(),
            default_fallback,
        }
    }

    /// Policy admitting any authenticated identity regardless of role.
    pub const fn any_authenticated(default_fallback: Destination) -> Self {
        Self {
            allowed_roles: None,
            fallback_by_role: BTreeMap::new(),
            default_fallback,
        }
    }

    /// Route a specific denied role to its own destination instead of
    /// the default fallback.
    #[must_use]
    pub fn with_fallback(mut self, role: Role, destination: Destination) -> Self {
        self.fallback_by_role.insert(role, destination);
        self
    }

    /// Allowed role set, when the policy restricts by role.
    pub const fn allowed_roles(&self) -> Option<&BTreeSet<Role>> {
        self.allowed_roles.as_ref()
    }

    /// Fallback used when no per-role destination applies.
    pub const fn default_fallback(&self) -> &Destination {
        &self.default_fallback
    }

    /// Gate a protected view against the current session snapshot.
    ///
    /// Total over every snapshot/policy combination: the result is
    /// always exactly one of `Pending`, `Allow`, or `Redirect`.
    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> AccessDecision {
        if snapshot.is_resolving() {
            return AccessDecision::Pending;
        }
        if !snapshot.is_authenticated() {
            return AccessDecision::Redirect(self.default_fallback.clone());
        }
        let Some(allowed) = &self.allowed_roles else {
            return AccessDecision::Allow;
        };
        match snapshot.role() {
            Some(role) if allowed.contains(&role) => AccessDecision::Allow,
            Some(role) => AccessDecision::Redirect(
                self.fallback_by_role
                    .get(&role)
                    .unwrap_or(&self.default_fallback)
                    .clone(),
            ),
            None => AccessDecision::Redirect(self.default_fallback.clone()),
        }
    }
}
