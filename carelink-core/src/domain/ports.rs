//! Domain ports for the identity side of the core.
//!
//! Ports describe how the domain expects to interact with driven
//! collaborators (the external credential provider and the user
//! directory). Each trait exposes strongly typed errors so adapters map
//! their failures into predictable variants.
//!
//! The tag I/O port lives in [`crate::nfc::platform`]; the two
//! subsystems only meet in the embedding application.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::identity::{Identity, PatientProfile, SubjectId, UserRecord};
use super::snapshot::RoleAssignment;

/// Sign-in/sign-out notification delivered by the credential provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialEvent {
    /// A credential is present for the given identity.
    SignedIn(Identity),
    /// No credential is present.
    SignedOut,
}

/// Errors surfaced by the credential provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialProviderError {
    /// Email/password pair did not match an account.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// An account already exists for the email being registered.
    #[error("an account already exists for {email}")]
    AlreadyRegistered {
        /// Email the registration attempted to claim.
        email: String,
    },
    /// The external sign-in flow was cancelled or failed.
    #[error("external sign-in failed: {message}")]
    ExternalFlowFailed {
        /// Provider-reported reason.
        message: String,
    },
    /// The provider backend is unreachable or misbehaving.
    #[error("credential provider unavailable: {message}")]
    Unavailable {
        /// Provider-reported reason.
        message: String,
    },
}

impl CredentialProviderError {
    /// Helper for failed external sign-in flows.
    pub fn external_flow_failed(message: impl Into<String>) -> Self {
        Self::ExternalFlowFailed {
            message: message.into(),
        }
    }

    /// Helper for backend-level failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Port to the external credential provider.
///
/// The provider owns the authoritative signed-in/signed-out state and
/// notifies subscribers of every change. The external sign-in flow
/// (`sign_in_with_external`) is an opaque call that resolves or rejects
/// an identity credential; its mechanics are out of scope.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Verify an email/password pair and sign the session in.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialProviderError>;

    /// Run the external provider's sign-in flow and sign the session in.
    async fn sign_in_with_external(&self) -> Result<Identity, CredentialProviderError>;

    /// Create a new identity with the given display name and sign the
    /// session in as it.
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, CredentialProviderError>;

    /// Sign the current session out.
    async fn sign_out(&self) -> Result<(), CredentialProviderError>;

    /// Subscribe to credential changes.
    ///
    /// The current state is delivered immediately as the first event, so
    /// a fresh subscriber never waits for a sign-in to learn that the
    /// session is signed out.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<CredentialEvent>;
}

/// Errors surfaced by the user directory adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Directory backend is unreachable.
    #[error("user directory unavailable: {message}")]
    Unavailable {
        /// Adapter-reported reason.
        message: String,
    },
    /// Query or write failed during execution.
    #[error("user directory query failed: {message}")]
    Query {
        /// Adapter-reported reason.
        message: String,
    },
}

impl DirectoryError {
    /// Helper for backend-level failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port to the user directory holding registration records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the role assignment for a subject.
    ///
    /// `Ok(None)` is the valid "role not yet provisioned" state, not a
    /// fault.
    async fn find_role(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Option<RoleAssignment>, DirectoryError>;

    /// Insert or replace a user record.
    async fn save_user(&self, record: &UserRecord) -> Result<(), DirectoryError>;

    /// Insert or replace a patient profile.
    async fn save_patient_profile(&self, profile: &PatientProfile)
        -> Result<(), DirectoryError>;
}
