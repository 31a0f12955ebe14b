//! The single writer of the process-wide session snapshot.
//!
//! [`SessionService`] owns a standing subscription to the credential
//! provider and folds every sign-in/sign-out notification, together with
//! the associated role lookup, into a [`SessionSnapshot`] readable by any
//! number of collaborators. Events are resolved strictly sequentially on
//! one task, so a snapshot always reflects strictly later information
//! than its predecessor and a stale role lookup can never overwrite a
//! later sign-out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::PortalConfig;

use super::auth::{Registration, SignInCredentials};
use super::error::AuthError;
use super::identity::{Identity, PatientProfile, SubjectId, UserRecord};
use super::ports::{CredentialEvent, CredentialProvider, UserDirectory};
use super::role::Role;
use super::snapshot::{RoleAssignment, SessionSnapshot};
use super::AuthResult;

/// Identity resolver and sign-in surface for the portal.
///
/// One instance per process; create it at application init with
/// [`SessionService::start`] and release the standing subscription with
/// [`SessionService::shutdown`] (or by dropping the service).
pub struct SessionService {
    provider: Arc<dyn CredentialProvider>,
    directory: Arc<dyn UserDirectory>,
    config: PortalConfig,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    resolver: JoinHandle<()>,
}

impl SessionService {
    /// Begin the standing credential subscription and return the
    /// service.
    ///
    /// The snapshot starts in the resolving state and leaves it
    /// permanently once the provider delivers its first event.
    pub fn start(
        provider: Arc<dyn CredentialProvider>,
        directory: Arc<dyn UserDirectory>,
        config: PortalConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::resolving());
        let events = provider.subscribe();
        let resolver = tokio::spawn(resolve_events(
            events,
            Arc::clone(&directory),
            snapshot_tx.clone(),
        ));
        Self {
            provider,
            directory,
            config,
            snapshot_tx,
            resolver,
        }
    }

    /// Synchronous read of the current session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Release the standing credential subscription.
    pub fn shutdown(&self) {
        self.resolver.abort();
    }

    /// Verify an email/password pair, resolve the account's role, and
    /// enforce the role-match check.
    ///
    /// A mismatch (outside the staff equivalence class) or a missing
    /// user record forces a sign-out before the error is returned; the
    /// session is never left authenticated under a role the caller did
    /// not expect.
    pub async fn sign_in_with_credentials(
        &self,
        credentials: &SignInCredentials,
        expected_role: Role,
    ) -> AuthResult<RoleAssignment> {
        let identity = self
            .provider
            .sign_in_with_password(credentials.email(), credentials.password())
            .await?;
        let Some(assignment) = self.directory.find_role(identity.subject_id()).await? else {
            self.reverse_sign_in("no user profile found").await;
            return Err(AuthError::ProfileMissing {
                subject_id: identity.subject_id().clone(),
            });
        };
        self.enforce_role_match(expected_role, &assignment).await?;
        debug!(subject = %assignment.subject_id(), role = %assignment.role(), "credentials sign-in accepted");
        Ok(assignment)
    }

    /// Run the external provider's sign-in flow and enforce the
    /// role-match check.
    ///
    /// When no role assignment exists yet for the resolved subject, one
    /// is provisioned from `expected_role` (first-touch registration via
    /// the external provider) instead of failing.
    pub async fn sign_in_with_external_provider(
        &self,
        expected_role: Role,
    ) -> AuthResult<RoleAssignment> {
        let identity = self.provider.sign_in_with_external().await?;
        match self.directory.find_role(identity.subject_id()).await? {
            Some(assignment) => {
                self.enforce_role_match(expected_role, &assignment).await?;
                debug!(subject = %assignment.subject_id(), role = %assignment.role(), "external sign-in accepted");
                Ok(assignment)
            }
            None => self.provision_first_touch(&identity, expected_role).await,
        }
    }

    /// Create a new patient identity, persist its user record and
    /// profile, and return the new subject id for downstream use such
    /// as tag writing.
    pub async fn register_new_identity(
        &self,
        registration: &Registration,
    ) -> AuthResult<SubjectId> {
        let credentials = registration.credentials();
        let identity = self
            .provider
            .create_identity(
                credentials.email(),
                credentials.password(),
                registration.display_name(),
            )
            .await?;
        let subject_id = identity.subject_id().clone();
        let email = identity
            .email()
            .map(ToOwned::to_owned)
            .or_else(|| Some(credentials.email().to_owned()));
        let created_at = Utc::now();

        self.directory
            .save_user(&UserRecord {
                subject_id: subject_id.clone(),
                email: email.clone(),
                display_name: Some(registration.display_name().to_owned()),
                role: Role::Patient,
                created_at,
            })
            .await?;
        self.directory
            .save_patient_profile(&PatientProfile {
                subject_id: subject_id.clone(),
                name: registration.display_name().to_owned(),
                email,
                created_at,
                history: Vec::new(),
                nfc_profile_url: self.config.patient_profile_url(&subject_id),
            })
            .await?;
        debug!(subject = %subject_id, "patient registered");
        Ok(subject_id)
    }

    /// Sign the current session out.
    pub async fn sign_out(&self) -> AuthResult<()> {
        self.provider.sign_out().await?;
        Ok(())
    }

    async fn provision_first_touch(
        &self,
        identity: &Identity,
        expected_role: Role,
    ) -> AuthResult<RoleAssignment> {
        let subject_id = identity.subject_id().clone();
        self.directory
            .save_user(&UserRecord {
                subject_id: subject_id.clone(),
                email: identity.email().map(ToOwned::to_owned),
                display_name: identity.display_name().map(ToOwned::to_owned),
                role: expected_role,
                created_at: Utc::now(),
            })
            .await?;
        debug!(subject = %subject_id, role = %expected_role, "first-touch role provisioned");
        Ok(RoleAssignment::new(subject_id, expected_role))
    }

    async fn enforce_role_match(
        &self,
        expected: Role,
        assignment: &RoleAssignment,
    ) -> AuthResult<()> {
        if expected.accepts(assignment.role()) {
            return Ok(());
        }
        self.reverse_sign_in("role mismatch").await;
        Err(AuthError::UnauthorizedRole {
            expected,
            actual: assignment.role(),
        })
    }

    /// Force a sign-out after a rejected sign-in, keeping the original
    /// failure as the surfaced error.
    async fn reverse_sign_in(&self, reason: &str) {
        warn!(reason, "reversing sign-in");
        if let Err(error) = self.provider.sign_out().await {
            warn!(%error, "forced sign-out failed");
        }
    }
}

impl Drop for SessionService {
    fn drop(&mut self) {
        self.resolver.abort();
    }
}

/// Fold credential events into session snapshots, one at a time.
async fn resolve_events(
    mut events: mpsc::UnboundedReceiver<CredentialEvent>,
    directory: Arc<dyn UserDirectory>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
) {
    while let Some(event) = events.recv().await {
        let snapshot = match event {
            CredentialEvent::SignedOut => SessionSnapshot::signed_out(),
            CredentialEvent::SignedIn(identity) => {
                let role = match directory.find_role(identity.subject_id()).await {
                    Ok(role) => role,
                    Err(error) => {
                        warn!(%error, subject = %identity.subject_id(), "role lookup failed");
                        None
                    }
                };
                SessionSnapshot::authenticated(identity, role)
            }
        };
        snapshot_tx.send_replace(snapshot);
    }
    debug!("credential subscription closed");
}
