//! Near-field tag I/O subsystem.
//!
//! The platform primitive (Web NFC in the original deployment) sits
//! behind the [`platform::TagPlatform`] port. On top of it the subsystem
//! offers:
//! - [`capability::CapabilityProbe`] — one-shot support detection.
//! - [`codec`] — decoding a received tag message into text payloads and
//!   encoding an outbound payload into a writable record.
//! - [`scan::ScanSession`] — the cancellable read lifecycle.
//! - [`write::WriteSession`] — the single-shot write lifecycle.

pub mod capability;
pub mod codec;
pub mod platform;
pub mod scan;
pub mod write;

pub use self::capability::CapabilityProbe;
pub use self::codec::{DecodedPayload, TagMessage, TagRecord, TagRecordKind};
pub use self::platform::{TagPlatform, TagPlatformError};
pub use self::scan::{ScanError, ScanSession, ScanState};
pub use self::write::{WriteError, WriteSession, WriteState};

/// Message shown when the runtime lacks tag I/O support.
pub const NOT_SUPPORTED_MESSAGE: &str = "NFC is not supported on this device or browser.";
