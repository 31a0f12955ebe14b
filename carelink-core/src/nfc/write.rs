//! The single-shot tag write lifecycle.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::capability::CapabilityProbe;
use super::codec;
use super::platform::{TagPlatform, TagPlatformError};
use super::NOT_SUPPORTED_MESSAGE;

/// Fallback message when a write failure carries no platform text.
pub const WRITE_FAILURE_MESSAGE: &str = "Failed to write to NFC tag.";

/// Lifecycle state of a [`WriteSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// No write attempted yet.
    Idle,
    /// A write request is in flight.
    Writing,
    /// The last write completed.
    Success,
    /// The last write failed; see [`WriteSession::last_error`].
    /// Restartable.
    Failed,
}

/// Errors returned by [`WriteSession::write`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The runtime lacks tag I/O support. Terminal for this runtime;
    /// never retried automatically.
    #[error("{}", NOT_SUPPORTED_MESSAGE)]
    NotSupported,
    /// A write is already in flight on this session.
    #[error("a write is already in progress")]
    WriteInProgress,
    /// The platform reported a failure during the write.
    #[error("{message}")]
    Platform {
        /// Platform-reported reason, or [`WRITE_FAILURE_MESSAGE`].
        message: String,
    },
}

/// Owns one tag write at a time: start, single-shot write,
/// success/failure capture.
///
/// Each write is independent; nothing is retained between attempts
/// beyond the last outcome. There is no queuing: a second write while
/// one is in flight is rejected with [`WriteError::WriteInProgress`].
/// Once issued, a write runs to completion — there is no mid-flight
/// cancellation.
pub struct WriteSession {
    platform: Arc<dyn TagPlatform>,
    probe: CapabilityProbe,
    state: WriteState,
    last_error: Option<String>,
}

impl WriteSession {
    /// Build a session over the given platform.
    pub fn new(platform: Arc<dyn TagPlatform>) -> Self {
        let probe = CapabilityProbe::new(Arc::clone(&platform));
        Self {
            platform,
            probe,
            state: WriteState::Idle,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> WriteState {
        self.state
    }

    /// Message captured by the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Encode `text` as a `url` record and push it onto a tag.
    ///
    /// Valid from any state except `Writing`; a failed or completed
    /// attempt may be retried. The returned result resolves exactly
    /// once per attempt. When the capability probe answers false the
    /// session fails immediately and no platform call is made.
    pub async fn write(&mut self, text: &str) -> Result<(), WriteError> {
        if self.state == WriteState::Writing {
            return Err(WriteError::WriteInProgress);
        }
        if !self.probe.is_supported() {
            self.fail(NOT_SUPPORTED_MESSAGE.to_owned());
            return Err(WriteError::NotSupported);
        }

        self.last_error = None;
        self.state = WriteState::Writing;
        let record = codec::encode(text);

        match self.platform.write_record(&record).await {
            Ok(()) => {
                debug!("tag write completed");
                self.state = WriteState::Success;
                Ok(())
            }
            Err(error) => {
                let message = write_failure_message(&error);
                self.fail(message.clone());
                Err(WriteError::Platform { message })
            }
        }
    }

    fn fail(&mut self, message: String) {
        debug!(%message, "tag write failed");
        self.last_error = Some(message);
        self.state = WriteState::Failed;
    }
}

fn write_failure_message(error: &TagPlatformError) -> String {
    let message = error.message();
    if message.is_empty() {
        WRITE_FAILURE_MESSAGE.to_owned()
    } else {
        message.to_owned()
    }
}
