//! The closed role set and the staff equivalence rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried by a registered identity.
///
/// Serialises to the lowercase names persisted in user records
/// (`"doctor"`, `"nurse"`, `"patient"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Clinical staff with full patient-record access.
    Doctor,
    /// Clinical staff with full patient-record access.
    Nurse,
    /// Holder of a patient profile and NFC card.
    Patient,
}

impl Role {
    /// Whether the role belongs to the staff equivalence class.
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Doctor | Self::Nurse)
    }

    /// Whether a sign-in expecting `self` accepts an account whose
    /// assigned role is `actual`.
    ///
    /// Staff roles are mutually acceptable: a doctor login form admits a
    /// nurse account and vice versa. Patient expectations require an
    /// exact match.
    ///
    /// # Examples
    /// ```
    /// use carelink_core::Role;
    ///
    /// assert!(Role::Doctor.accepts(Role::Nurse));
    /// assert!(!Role::Doctor.accepts(Role::Patient));
    /// assert!(!Role::Patient.accepts(Role::Nurse));
    /// ```
    pub fn accepts(self, actual: Self) -> bool {
        self == actual || (self.is_staff() && actual.is_staff())
    }

    /// Lowercase persisted name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Self::Doctor),
            "nurse" => Ok(Self::Nurse),
            "patient" => Ok(Self::Patient),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}
