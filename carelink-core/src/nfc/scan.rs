//! The cancellable tag read lifecycle.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::capability::CapabilityProbe;
use super::codec::{self, DecodedPayload};
use super::platform::{TagPlatform, TagPlatformError};
use super::NOT_SUPPORTED_MESSAGE;

/// Fallback message when a listen failure carries no platform text.
pub const READ_FAILURE_MESSAGE: &str = "Failed to read NFC tag.";

/// Callback receiving each decoded payload, one at a time, in record
/// order.
pub type PayloadHandler = Arc<dyn Fn(DecodedPayload) + Send + Sync>;

/// Lifecycle state of a [`ScanSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No scan running; a scan may be started.
    Idle,
    /// Listening acquisition is in flight.
    Probing,
    /// The platform is listening and payloads are being delivered.
    Active,
    /// The last start attempt failed; see
    /// [`ScanSession::last_error`]. Restartable.
    Failed,
}

/// Errors returned by [`ScanSession::start`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The runtime lacks tag I/O support. Terminal for this runtime;
    /// never retried automatically.
    #[error("{}", NOT_SUPPORTED_MESSAGE)]
    NotSupported,
    /// A scan is already probing or active on this session.
    #[error("a scan is already running")]
    AlreadyRunning,
    /// The platform failed to begin listening.
    #[error("{message}")]
    Listen {
        /// Platform-reported reason, or [`READ_FAILURE_MESSAGE`].
        message: String,
    },
}

/// Owns one tag read lifecycle: start, active scan, per-record payload
/// dispatch, stop.
///
/// At most one scan may be probing or active per session; starting again
/// while not restartable is rejected with
/// [`ScanError::AlreadyRunning`]. Dropping the session releases the
/// outstanding cancellation token, so teardown without an explicit
/// [`ScanSession::stop`] does not leak the platform listener.
pub struct ScanSession {
    platform: Arc<dyn TagPlatform>,
    probe: CapabilityProbe,
    state: ScanState,
    last_error: Option<String>,
    cancel: Option<CancellationToken>,
    forwarder: Option<JoinHandle<()>>,
}

impl ScanSession {
    /// Build a session over the given platform.
    pub fn new(platform: Arc<dyn TagPlatform>) -> Self {
        let probe = CapabilityProbe::new(Arc::clone(&platform));
        Self {
            platform,
            probe,
            state: ScanState::Idle,
            last_error: None,
            cancel: None,
            forwarder: None,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Message captured by the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start scanning, delivering each decoded payload to `on_payload`.
    ///
    /// Valid from `Idle`, or from `Failed` as a caller-initiated
    /// restart. When the capability probe answers false the session
    /// fails immediately with a fixed message and no platform call is
    /// made.
    pub async fn start(&mut self, on_payload: PayloadHandler) -> Result<(), ScanError> {
        match self.state {
            ScanState::Idle | ScanState::Failed => {}
            ScanState::Probing | ScanState::Active => return Err(ScanError::AlreadyRunning),
        }
        if !self.probe.is_supported() {
            self.fail(NOT_SUPPORTED_MESSAGE.to_owned());
            return Err(ScanError::NotSupported);
        }

        self.last_error = None;
        self.state = ScanState::Probing;
        let cancel = CancellationToken::new();

        match self.platform.start_listening(cancel.clone()).await {
            Ok(receiver) => {
                debug!("scan listening acquired");
                self.state = ScanState::Active;
                self.cancel = Some(cancel.clone());
                self.forwarder = Some(tokio::spawn(forward_payloads(
                    receiver, cancel, on_payload,
                )));
                Ok(())
            }
            Err(error) => {
                cancel.cancel();
                let message = listen_failure_message(&error);
                self.fail(message.clone());
                Err(ScanError::Listen { message })
            }
        }
    }

    /// Stop scanning and release the cancellation token.
    ///
    /// Idempotent: stopping an `Idle` session is a no-op. A failed
    /// session stays failed until restarted.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("scan stopped");
            cancel.cancel();
        }
        self.forwarder = None;
        if matches!(self.state, ScanState::Probing | ScanState::Active) {
            self.state = ScanState::Idle;
        }
    }

    fn fail(&mut self, message: String) {
        debug!(%message, "scan failed");
        self.last_error = Some(message);
        self.state = ScanState::Failed;
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listen_failure_message(error: &TagPlatformError) -> String {
    let message = error.message();
    if message.is_empty() {
        READ_FAILURE_MESSAGE.to_owned()
    } else {
        message.to_owned()
    }
}

/// Forward decoded payloads to the handler until cancelled or the
/// platform closes the stream.
async fn forward_payloads(
    mut receiver: tokio::sync::mpsc::Receiver<codec::TagMessage>,
    cancel: CancellationToken,
    on_payload: PayloadHandler,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            maybe_message = receiver.recv() => {
                let Some(message) = maybe_message else { break };
                for payload in codec::decode(&message) {
                    // A stop between records must halt delivery.
                    if cancel.is_cancelled() {
                        return;
                    }
                    on_payload(payload);
                }
            }
        }
    }
}
