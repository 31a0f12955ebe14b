//! Error taxonomy for identity operations.
//!
//! Transport agnostic: the embedding application maps these onto its own
//! user-facing surface. A missing role assignment is deliberately *not*
//! represented here — lookups return `Option` for that state.

use thiserror::Error;

use super::auth::CredentialValidationError;
use super::identity::SubjectId;
use super::ports::{CredentialProviderError, DirectoryError};
use super::role::Role;

/// Failures surfaced by [`SessionService`](super::session_service::SessionService)
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The credential provider rejected or failed the operation.
    #[error(transparent)]
    Provider(#[from] CredentialProviderError),
    /// The user directory failed the operation.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    /// Caller-supplied credentials failed validation before any
    /// provider call was made.
    #[error(transparent)]
    Validation(#[from] CredentialValidationError),
    /// Credential verification succeeded but the account's role does
    /// not satisfy the expected role. The session has been signed out.
    #[error("unauthorized {expected} sign-in: account role is {actual}")]
    UnauthorizedRole {
        /// Role the caller expected.
        expected: Role,
        /// Role actually assigned to the account.
        actual: Role,
    },
    /// Credential verification succeeded but no user record exists for
    /// the subject. The session has been signed out.
    #[error("no user profile found for subject {subject_id}")]
    ProfileMissing {
        /// Subject whose record is missing.
        subject_id: SubjectId,
    },
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unauthorized_role_names_both_roles() {
        let err = AuthError::UnauthorizedRole {
            expected: Role::Doctor,
            actual: Role::Patient,
        };
        assert_eq!(
            err.to_string(),
            "unauthorized doctor sign-in: account role is patient"
        );
    }

    #[rstest]
    fn provider_errors_pass_through() {
        let err = AuthError::from(CredentialProviderError::InvalidCredentials);
        assert_eq!(err.to_string(), "invalid email or password");
    }
}
