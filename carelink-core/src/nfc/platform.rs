//! Port to the runtime's tag I/O primitive.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::codec::{TagMessage, TagRecord};

/// Errors surfaced by the tag platform adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagPlatformError {
    /// The platform failed to begin listening for tags.
    #[error("{message}")]
    Listen {
        /// Platform-reported reason.
        message: String,
    },
    /// The platform failed to write the record.
    #[error("{message}")]
    Write {
        /// Platform-reported reason.
        message: String,
    },
}

impl TagPlatformError {
    /// Helper for listen failures.
    pub fn listen(message: impl Into<String>) -> Self {
        Self::Listen {
            message: message.into(),
        }
    }

    /// Helper for write failures.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Platform-reported message, if any.
    pub fn message(&self) -> &str {
        match self {
            Self::Listen { message } | Self::Write { message } => message.as_str(),
        }
    }
}

/// Port to the runtime's tag I/O primitive.
///
/// Support detection has no error path: absence of the primitive is a
/// valid, non-exceptional answer, assumed stable for the lifetime of the
/// process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagPlatform: Send + Sync {
    /// Whether the runtime exposes tag I/O at all.
    fn is_supported(&self) -> bool;

    /// Begin listening for tag messages.
    ///
    /// The adapter must stop delivering into the returned channel once
    /// `cancel` is triggered; closing the channel ends the scan from the
    /// platform side.
    async fn start_listening(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<TagMessage>, TagPlatformError>;

    /// Push a single record onto a tag. Single-shot: no retry, no
    /// cancellation.
    async fn write_record(&self, record: &TagRecord) -> Result<(), TagPlatformError>;
}
