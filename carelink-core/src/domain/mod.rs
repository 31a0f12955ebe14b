//! Domain primitives and services for identity, roles, and access.
//!
//! Purpose: define the strongly typed session model shared by the
//! embedding application — who is signed in, which role they carry, and
//! whether a protected view may render. Types are immutable and document
//! their invariants and serialisation contracts in each type's Rustdoc.
//!
//! Public surface:
//! - [`Role`] / [`RoleAssignment`](snapshot::RoleAssignment) — the closed
//!   role set and its binding to a subject.
//! - [`SubjectId`] / [`Identity`](identity::Identity) — authenticated
//!   identity primitives.
//! - [`SessionSnapshot`](snapshot::SessionSnapshot) — the process-wide
//!   tri-state session view.
//! - [`AccessPolicy`](access::AccessPolicy) — pure render/redirect
//!   decisions for protected views.
//! - [`SessionService`](session_service::SessionService) — the single
//!   writer of the session snapshot.

pub mod access;
pub mod auth;
pub mod error;
pub mod identity;
pub mod ports;
pub mod role;
pub mod session_service;
pub mod snapshot;

pub use self::auth::{CredentialValidationError, Registration, SignInCredentials};
pub use self::error::AuthError;
pub use self::identity::{Identity, IdentityValidationError, SubjectId};
pub use self::role::{Role, RoleParseError};
pub use self::snapshot::{RoleAssignment, SessionSnapshot};

/// Convenient result alias for identity operations.
pub type AuthResult<T> = Result<T, AuthError>;
