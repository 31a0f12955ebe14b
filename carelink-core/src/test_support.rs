//! Scripted doubles and fixtures for integration tests.
//!
//! Enabled by the `test-support` feature; the crate's own dev-dependency
//! turns it on for the `tests/` directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::nfc::codec::{TagMessage, TagRecord};
use crate::nfc::platform::{TagPlatform, TagPlatformError};

/// Install a test subscriber honouring `RUST_LOG`, once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct ScriptedState {
    messages: Vec<TagMessage>,
    next_listen_failure: Option<String>,
    next_write_failure: Option<String>,
    written: Vec<TagRecord>,
}

/// [`TagPlatform`] double that replays scripted messages on scan and
/// records written records for assertion.
pub struct ScriptedTagPlatform {
    supported: bool,
    state: Mutex<ScriptedState>,
    listen_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl ScriptedTagPlatform {
    /// Platform that reports tag I/O support.
    pub fn supported() -> Self {
        Self::with_support(true)
    }

    /// Platform that reports no tag I/O support.
    pub fn unsupported() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            supported,
            state: Mutex::new(ScriptedState::default()),
            listen_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    /// Queue a message for the next scan to replay.
    pub fn queue_message(&self, message: TagMessage) {
        self.lock().messages.push(message);
    }

    /// Make the next listen attempt fail with the given message.
    pub fn fail_next_listen(&self, message: impl Into<String>) {
        self.lock().next_listen_failure = Some(message.into());
    }

    /// Make the next write attempt fail with the given message.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.lock().next_write_failure = Some(message.into());
    }

    /// Records written so far, oldest first.
    pub fn written(&self) -> Vec<TagRecord> {
        self.lock().written.clone()
    }

    /// Number of listen attempts made against the platform.
    pub fn listen_calls(&self) -> usize {
        self.listen_calls.load(Ordering::SeqCst)
    }

    /// Number of write attempts made against the platform.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().expect("scripted state poisoned")
    }
}

#[async_trait]
impl TagPlatform for ScriptedTagPlatform {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn start_listening(
        &self,
        _cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<TagMessage>, TagPlatformError> {
        self.listen_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(message) = state.next_listen_failure.take() {
            return Err(TagPlatformError::listen(message));
        }
        let messages = std::mem::take(&mut state.messages);
        let (tx, rx) = mpsc::channel(messages.len().max(1));
        for message in messages {
            let _ = tx.try_send(message);
        }
        // Dropping the sender ends the replay from the platform side.
        Ok(rx)
    }

    async fn write_record(&self, record: &TagRecord) -> Result<(), TagPlatformError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(message) = state.next_write_failure.take() {
            return Err(TagPlatformError::write(message));
        }
        state.written.push(record.clone());
        Ok(())
    }
}
