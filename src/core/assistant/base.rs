//! Types shared by every dialog backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::audio::PcmFormat;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream error: {0}")]
    StreamError(String),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

/// Opaque dialog state handed back by the backend and replayed on the next
/// turn of the same session. Empty for a fresh session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState(Bytes);

impl ConversationState {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

/// Whether the assistant expects the user to keep talking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicrophoneMode {
    /// Follow-on dialog: keep the skill session listening.
    Open,
    /// The assistant is done: end the turn.
    #[default]
    Closed,
}

impl MicrophoneMode {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Audio the session sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInSpec {
    pub format: PcmFormat,
}

/// Audio the session asks the backend to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioOutSpec {
    pub format: PcmFormat,
    pub volume_percentage: i32,
}

impl Default for AudioInSpec {
    fn default() -> Self {
        Self {
            format: PcmFormat::default(),
        }
    }
}

impl Default for AudioOutSpec {
    fn default() -> Self {
        Self {
            format: PcmFormat::default(),
            volume_percentage: 100,
        }
    }
}

/// Outbound message on the dialog stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogRequest {
    Config {
        audio_in: AudioInSpec,
        audio_out: AudioOutSpec,
        prior_state: Option<ConversationState>,
    },
    Audio(Bytes),
}

/// Contents of a backend `result` message. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogResult {
    pub request_text: Option<String>,
    pub response_text: Option<String>,
    pub microphone_mode: Option<MicrophoneMode>,
    pub conversation_state: Option<ConversationState>,
}

/// Inbound event on the dialog stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UtteranceEnded,
    Result(DialogResult),
    AudioOut(Bytes),
    Error(String),
    /// The inbound half of the stream closed.
    Ended,
}

/// The two halves of an open dialog stream.
///
/// Dropping `requests` half-closes the stream; `events` closing means the
/// backend is done.
pub struct DialogChannels {
    pub requests: mpsc::Sender<DialogRequest>,
    pub events: mpsc::Receiver<SessionEvent>,
}

/// Opens bidirectional dialog streams.
#[async_trait]
pub trait DialogBackend: Send + Sync {
    async fn open(&self, access_token: &str) -> AssistantResult<DialogChannels>;
}
