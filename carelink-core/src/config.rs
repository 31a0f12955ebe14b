//! Portal configuration supplied by the embedding application.
//!
//! The core has no process surface of its own, so configuration arrives
//! as a deserialisable struct rather than flags or environment lookups.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::SubjectId;

/// Path component of every patient profile URL written to a tag.
pub const PATIENT_LOGIN_PATH: &str = "/login/patient";

/// Validation errors raised when constructing [`PortalConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    /// The origin cannot serve as a base for profile URLs.
    #[error("portal origin must be an absolute http(s) style URL")]
    OpaqueOrigin,
}

/// Static configuration for the portal core.
///
/// ## Invariants
/// - `origin` is an absolute URL usable as a base (never `data:` or
///   another cannot-be-a-base scheme).
///
/// # Examples
/// ```
/// use carelink_core::PortalConfig;
/// use url::Url;
///
/// let origin = Url::parse("https://portal.example").expect("valid url");
/// let config = PortalConfig::new(origin).expect("valid origin");
/// assert_eq!(config.origin().scheme(), "https");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PortalConfigDto")]
pub struct PortalConfig {
    origin: Url,
}

impl PortalConfig {
    /// Build a configuration from the portal's public origin.
    pub fn new(origin: Url) -> Result<Self, ConfigValidationError> {
        if origin.cannot_be_a_base() {
            return Err(ConfigValidationError::OpaqueOrigin);
        }
        Ok(Self { origin })
    }

    /// Public origin the portal is served from.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Profile URL written to a patient's NFC card.
    ///
    /// The shape is the persisted contract consumed by the scan path:
    /// `{origin}/login/patient?id={subjectId}`.
    ///
    /// # Examples
    /// ```
    /// use carelink_core::{PortalConfig, SubjectId};
    /// use url::Url;
    ///
    /// let config = PortalConfig::new(Url::parse("https://portal.example").unwrap()).unwrap();
    /// let id = SubjectId::new("abc-123").unwrap();
    /// assert_eq!(
    ///     config.patient_profile_url(&id).as_str(),
    ///     "https://portal.example/login/patient?id=abc-123",
    /// );
    /// ```
    pub fn patient_profile_url(&self, subject_id: &SubjectId) -> Url {
        let mut url = self.origin.clone();
        url.set_path(PATIENT_LOGIN_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair("id", subject_id.as_str());
        url
    }
}

#[derive(Debug, Deserialize)]
struct PortalConfigDto {
    origin: Url,
}

impl TryFrom<PortalConfigDto> for PortalConfig {
    type Error = ConfigValidationError;

    fn try_from(value: PortalConfigDto) -> Result<Self, Self::Error> {
        Self::new(value.origin)
    }
}
