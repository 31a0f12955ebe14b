//! In-memory credential provider and user directory.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::identity::{Identity, PatientProfile, SubjectId, UserRecord};
use crate::domain::ports::{
    CredentialEvent, CredentialProvider, CredentialProviderError, DirectoryError, UserDirectory,
};
use crate::domain::snapshot::RoleAssignment;

#[derive(Debug, Clone)]
struct Account {
    subject_id: SubjectId,
    email: String,
    password: String,
    display_name: Option<String>,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity::new(
            self.subject_id.clone(),
            Some(self.email.clone()),
            self.display_name.clone(),
        )
    }
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<String, Account>,
    external_identity: Option<Identity>,
    current: Option<Identity>,
    subscribers: Vec<mpsc::UnboundedSender<CredentialEvent>>,
}

impl ProviderState {
    fn notify(&mut self, event: &CredentialEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn set_current(&mut self, identity: Identity) {
        self.current = Some(identity.clone());
        self.notify(&CredentialEvent::SignedIn(identity));
    }
}

/// In-memory [`CredentialProvider`] holding password accounts and an
/// optional scripted external identity.
#[derive(Default)]
pub struct InMemoryCredentialProvider {
    state: Mutex<ProviderState>,
}

impl InMemoryCredentialProvider {
    /// Create an empty provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a password account without signing it in, returning its
    /// subject id.
    pub fn seed_account(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        display_name: Option<&str>,
    ) -> SubjectId {
        let subject_id = SubjectId::random();
        let email = email.into();
        let account = Account {
            subject_id: subject_id.clone(),
            email: email.clone(),
            password: password.into(),
            display_name: display_name.map(ToOwned::to_owned),
        };
        self.lock().accounts.insert(email, account);
        subject_id
    }

    /// Script the identity the external sign-in flow resolves to.
    pub fn set_external_identity(&self, identity: Identity) {
        self.lock().external_identity = Some(identity);
    }

    /// Identity currently signed in, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().expect("provider state poisoned")
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialProviderError> {
        let mut state = self.lock();
        let Some(account) = state.accounts.get(email) else {
            return Err(CredentialProviderError::InvalidCredentials);
        };
        if account.password != password {
            return Err(CredentialProviderError::InvalidCredentials);
        }
        let identity = account.identity();
        state.set_current(identity.clone());
        Ok(identity)
    }

    async fn sign_in_with_external(&self) -> Result<Identity, CredentialProviderError> {
        let mut state = self.lock();
        let Some(identity) = state.external_identity.clone() else {
            return Err(CredentialProviderError::external_flow_failed(
                "external sign-in was cancelled",
            ));
        };
        state.set_current(identity.clone());
        Ok(identity)
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, CredentialProviderError> {
        let mut state = self.lock();
        if state.accounts.contains_key(email) {
            return Err(CredentialProviderError::AlreadyRegistered {
                email: email.to_owned(),
            });
        }
        let account = Account {
            subject_id: SubjectId::random(),
            email: email.to_owned(),
            password: password.to_owned(),
            display_name: Some(display_name.to_owned()),
        };
        let identity = account.identity();
        state.accounts.insert(email.to_owned(), account);
        state.set_current(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), CredentialProviderError> {
        let mut state = self.lock();
        state.current = None;
        state.notify(&CredentialEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<CredentialEvent> {
        let mut state = self.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        let initial = match &state.current {
            Some(identity) => CredentialEvent::SignedIn(identity.clone()),
            None => CredentialEvent::SignedOut,
        };
        // Deliver the current state before any future change.
        let _ = tx.send(initial);
        state.subscribers.push(tx);
        rx
    }
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<SubjectId, UserRecord>,
    profiles: HashMap<SubjectId, PatientProfile>,
}

/// In-memory [`UserDirectory`] keyed by subject id.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    state: Mutex<DirectoryState>,
}

impl InMemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored user record for a subject, if any.
    pub fn user(&self, subject_id: &SubjectId) -> Option<UserRecord> {
        self.lock().users.get(subject_id).cloned()
    }

    /// Stored patient profile for a subject, if any.
    pub fn patient_profile(&self, subject_id: &SubjectId) -> Option<PatientProfile> {
        self.lock().profiles.get(subject_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("directory state poisoned")
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_role(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Option<RoleAssignment>, DirectoryError> {
        let state = self.lock();
        Ok(state
            .users
            .get(subject_id)
            .map(|record| RoleAssignment::new(record.subject_id.clone(), record.role)))
    }

    async fn save_user(&self, record: &UserRecord) -> Result<(), DirectoryError> {
        self.lock()
            .users
            .insert(record.subject_id.clone(), record.clone());
        Ok(())
    }

    async fn save_patient_profile(
        &self,
        profile: &PatientProfile,
    ) -> Result<(), DirectoryError> {
        self.lock()
            .profiles
            .insert(profile.subject_id.clone(), profile.clone());
        Ok(())
    }
}
