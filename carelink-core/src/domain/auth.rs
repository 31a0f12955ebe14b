//! Authentication primitives such as sign-in credentials.
//!
//! Keep inbound form parsing outside the domain by exposing constructors
//! that validate string inputs before a service talks to the credential
//! provider.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Same shape check as the portal's sign-in forms.
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validation errors raised by credential constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialValidationError {
    /// Email was missing or not shaped like an address.
    #[error("a valid email address is required")]
    InvalidEmail,
    /// Password is shorter than [`PASSWORD_MIN`] characters.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// Display name was missing or blank once trimmed.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `email` is trimmed and matches the portal's address shape check.
/// - `password` is at least [`PASSWORD_MIN`] characters and retains
///   caller-provided whitespace to avoid surprising credential
///   comparisons.
///
/// # Examples
/// ```
/// use carelink_core::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts("a@b.com", "secret1").unwrap();
/// assert_eq!(creds.email(), "a@b.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        let normalized = email.trim();
        if !email_regex().is_match(normalized) {
            return Err(CredentialValidationError::InvalidEmail);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address suitable for provider lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never echo the password into logs.
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated registration payload for a new patient identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    credentials: SignInCredentials,
    display_name: String,
}

impl Registration {
    /// Construct a registration from raw form inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, CredentialValidationError> {
        let credentials = SignInCredentials::try_from_parts(email, password)?;
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(CredentialValidationError::EmptyDisplayName);
        }
        Ok(Self {
            credentials,
            display_name: trimmed.to_owned(),
        })
    }

    /// Credentials for the new account.
    pub fn credentials(&self) -> &SignInCredentials {
        &self.credentials
    }

    /// Display name for the new account.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "secret1", CredentialValidationError::InvalidEmail)]
    #[case("not-an-email", "secret1", CredentialValidationError::InvalidEmail)]
    #[case("a@b", "secret1", CredentialValidationError::InvalidEmail)]
    #[case("a @b.com", "secret1", CredentialValidationError::InvalidEmail)]
    #[case("a@b.com", "short", CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN })]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        let err = SignInCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  a@b.com  ", "secret1")]
    #[case("jane.doe@clinic.example", "correct horse battery")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds = SignInCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn debug_redacts_password() {
        let creds =
            SignInCredentials::try_from_parts("a@b.com", "secret1").expect("valid inputs");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret1"));
    }

    #[rstest]
    #[case("   ")]
    #[case("")]
    fn registration_rejects_blank_name(#[case] name: &str) {
        let err = Registration::try_from_parts("a@b.com", "secret1", name)
            .expect_err("blank names must fail");
        assert_eq!(err, CredentialValidationError::EmptyDisplayName);
    }

    #[rstest]
    fn registration_trims_name() {
        let registration = Registration::try_from_parts("a@b.com", "secret1", "  Jane Doe  ")
            .expect("valid inputs");
        assert_eq!(registration.display_name(), "Jane Doe");
    }
}
