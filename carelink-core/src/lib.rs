//! Embeddable core of an NFC-backed healthcare portal.
//!
//! The crate owns the two stateful subsystems of the portal and nothing
//! else: near-field tag I/O ([`nfc`]) and identity/role resolution with
//! access gating ([`domain`]). Page rendering, routing tables, and data
//! CRUD live in the embedding application, which talks to this core
//! through the ports in [`domain::ports`] and [`nfc::platform`].
//!
//! A reading flow ties the two halves together: a scanned tag carries a
//! patient profile URL whose `id` query parameter is a subject id, which
//! the embedder resolves against the session state maintained by
//! [`domain::session_service::SessionService`] and gates with
//! [`domain::access::AccessPolicy`].

pub mod config;
pub mod domain;
pub mod nfc;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;

pub use config::PortalConfig;
pub use domain::access::{AccessDecision, AccessPolicy, Destination};
pub use domain::session_service::SessionService;
pub use domain::snapshot::SessionSnapshot;
pub use domain::{Role, SubjectId};
