//! Identity primitives and the persisted registration record shapes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::role::Role;

/// Validation errors raised by identity constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityValidationError {
    /// Subject id was empty once trimmed.
    #[error("subject id must not be empty")]
    EmptySubjectId,
    /// Subject id carried surrounding whitespace.
    #[error("subject id must not contain surrounding whitespace")]
    PaddedSubjectId,
}

/// Stable opaque identifier for an authenticated identity.
///
/// ## Invariants
/// - Non-empty and free of surrounding whitespace. The content is
///   otherwise opaque; the credential provider chooses the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and construct a [`SubjectId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = id.into();
        if raw.is_empty() {
            return Err(IdentityValidationError::EmptySubjectId);
        }
        if raw.trim() != raw {
            return Err(IdentityValidationError::PaddedSubjectId);
        }
        Ok(Self(raw))
    }

    /// Generate a fresh random subject id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Authenticated identity as reported by the credential provider.
///
/// Immutable for the lifetime of a session except `display_name`, which
/// the provider may fill in after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    subject_id: SubjectId,
    email: Option<String>,
    display_name: Option<String>,
}

impl Identity {
    /// Build an identity from its parts.
    pub fn new(
        subject_id: SubjectId,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            subject_id,
            email,
            display_name,
        }
    }

    /// Stable subject identifier.
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Email address, when the provider reports one.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Display name, when the provider reports one.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// Persisted user record keyed by subject id.
///
/// Serialises camelCase to match the portal's storage contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Subject the record belongs to.
    pub subject_id: SubjectId,
    /// Email captured at registration.
    pub email: Option<String>,
    /// Display name captured at registration.
    pub display_name: Option<String>,
    /// Role assigned at registration, read-only afterwards.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Persisted patient profile consumed by the external storage
/// collaborator.
///
/// `nfc_profile_url` is the exact text written to the patient's NFC
/// card; the scan path round-trips the subject id out of its `id` query
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    /// Subject the profile belongs to.
    pub subject_id: SubjectId,
    /// Patient name shown to staff.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Visit history, empty at registration.
    pub history: Vec<String>,
    /// Profile URL written to the patient's NFC card.
    pub nfc_profile_url: Url,
}

/// Errors raised when a scanned payload does not carry a profile URL.
///
/// These report invalid data to the consumer; they are never a tag I/O
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileUrlError {
    /// The payload is not a parseable absolute URL.
    #[error("scanned payload is not a valid URL")]
    Malformed,
    /// The URL has no `id` query parameter.
    #[error("profile URL is missing the id parameter")]
    MissingId,
    /// The `id` parameter is not a usable subject id.
    #[error("profile URL carries an invalid subject id: {0}")]
    InvalidId(#[from] IdentityValidationError),
}

/// Extract the subject id from a scanned profile URL.
///
/// # Examples
/// ```
/// use carelink_core::domain::identity::subject_id_from_profile_url;
///
/// let id = subject_id_from_profile_url("https://portal.example/login/patient?id=p-7")
///     .expect("valid profile url");
/// assert_eq!(id.as_str(), "p-7");
/// ```
pub fn subject_id_from_profile_url(text: &str) -> Result<SubjectId, ProfileUrlError> {
    let url = Url::parse(text).map_err(|_| ProfileUrlError::Malformed)?;
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .ok_or(ProfileUrlError::MissingId)?;
    Ok(SubjectId::new(id)?)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", IdentityValidationError::EmptySubjectId)]
    #[case(" p-1", IdentityValidationError::PaddedSubjectId)]
    #[case("p-1 ", IdentityValidationError::PaddedSubjectId)]
    fn subject_id_rejects_bad_input(
        #[case] raw: &str,
        #[case] expected: IdentityValidationError,
    ) {
        let err = SubjectId::new(raw).expect_err("invalid id must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn random_subject_ids_are_distinct() {
        assert_ne!(SubjectId::random(), SubjectId::random());
    }

    #[rstest]
    fn extracts_id_from_profile_url() {
        let id = subject_id_from_profile_url("https://portal.example/login/patient?id=abc-123")
            .expect("valid url");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[rstest]
    #[case("not a url")]
    #[case("/login/patient?id=abc")]
    fn reports_malformed_urls(#[case] text: &str) {
        let err = subject_id_from_profile_url(text).expect_err("must fail");
        assert_eq!(err, ProfileUrlError::Malformed);
    }

    #[rstest]
    fn reports_missing_id_parameter() {
        let err = subject_id_from_profile_url("https://portal.example/login/patient?name=x")
            .expect_err("must fail");
        assert_eq!(err, ProfileUrlError::MissingId);
    }

    #[rstest]
    fn reports_blank_id_parameter() {
        let err = subject_id_from_profile_url("https://portal.example/login/patient?id=")
            .expect_err("must fail");
        assert_eq!(
            err,
            ProfileUrlError::InvalidId(IdentityValidationError::EmptySubjectId)
        );
    }

    #[rstest]
    fn user_record_serialises_camel_case() {
        let record = UserRecord {
            subject_id: SubjectId::new("p-1").expect("valid id"),
            email: Some("a@b.com".to_owned()),
            display_name: Some("Jane Doe".to_owned()),
            role: Role::Patient,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).expect("serialises");
        assert_eq!(value["subjectId"], "p-1");
        assert_eq!(value["displayName"], "Jane Doe");
        assert_eq!(value["role"], "patient");
    }
}
