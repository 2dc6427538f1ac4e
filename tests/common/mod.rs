//! In-process fakes for the synthesis, dialog backend and publishing seams.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use url::Url;

use alexa_assistant_bridge::config::BridgeConfig;
use alexa_assistant_bridge::core::assistant::{
    AssistantResult, ConversationState, DialogBackend, DialogChannels, DialogRequest,
    DialogResult, MicrophoneMode, SessionEvent,
};
use alexa_assistant_bridge::core::audio::{AudioEncoder, TranscodeError};
use alexa_assistant_bridge::core::publisher::{
    AudioPublisher, PublishError, PublishResult, PublishedAudio, build_object_key,
};
use alexa_assistant_bridge::core::tts::{SpeechSynthesizer, TTSError, TTSResult};
use alexa_assistant_bridge::state::AppState;

/// Half a second of 16 kHz mono 16-bit audio: eight 2048-byte chunks.
pub const SPEECH_BYTES: usize = 16_000;

/// Audio chunks the backend takes before it reports end of utterance.
pub const END_AFTER_CHUNKS: usize = 3;

// =============================================================================
// Speech synthesis
// =============================================================================

#[derive(Default)]
pub struct FakeSynthesizer {
    pub texts: Mutex<Vec<String>>,
    pub fail: bool,
    /// Overrides [`SPEECH_BYTES`].
    pub speech_bytes: Option<usize>,
}

impl FakeSynthesizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_speech_bytes(len: usize) -> Self {
        Self {
            speech_bytes: Some(len),
            ..Default::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(TTSError::ProviderError("polly unavailable".into()));
        }
        let len = self.speech_bytes.unwrap_or(SPEECH_BYTES);
        Ok(Bytes::from(vec![0x10u8; len]))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

// =============================================================================
// Dialog backend
// =============================================================================

/// How the scripted backend behaves once it has heard enough audio.
#[derive(Debug, Clone)]
pub enum Script {
    /// End of utterance, then a result and these audio frames (with `gap`
    /// between them), then the stream ends.
    Reply {
        result: DialogResult,
        audio: Vec<Bytes>,
        gap: Duration,
    },
    /// Never says anything and never ends the stream.
    Silent,
    /// Sends one audio frame straight away, then behaves like `Silent`.
    OneFrameThenSilent(Bytes),
    /// Accepts the call but never reads a single request.
    Stalled,
}

impl Script {
    pub fn reply(mode: MicrophoneMode, audio: Vec<Bytes>) -> Self {
        Self::Reply {
            result: DialogResult {
                request_text: Some("what is the weather".into()),
                response_text: Some("It is sunny".into()),
                microphone_mode: Some(mode),
                conversation_state: Some(ConversationState::new(Bytes::from_static(
                    b"next-state",
                ))),
            },
            audio,
            gap: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub tokens: Vec<String>,
    pub prior_states: Vec<Option<ConversationState>>,
    pub chunks_received: Vec<usize>,
}

pub struct ScriptedBackend {
    script: Script,
    pub log: Arc<Mutex<BackendLog>>,
    /// Keeps silent streams open for the whole test.
    held: Mutex<Vec<mpsc::Sender<SessionEvent>>>,
    held_requests: Mutex<Vec<mpsc::Receiver<DialogRequest>>>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            log: Arc::new(Mutex::new(BackendLog::default())),
            held: Mutex::new(Vec::new()),
            held_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn opens(&self) -> usize {
        self.log.lock().unwrap().tokens.len()
    }

    pub fn prior_states(&self) -> Vec<Option<ConversationState>> {
        self.log.lock().unwrap().prior_states.clone()
    }

    pub fn chunks_received(&self) -> Vec<usize> {
        self.log.lock().unwrap().chunks_received.clone()
    }
}

#[async_trait]
impl DialogBackend for ScriptedBackend {
    async fn open(&self, access_token: &str) -> AssistantResult<DialogChannels> {
        self.log.lock().unwrap().tokens.push(access_token.to_string());

        let (req_tx, mut req_rx) = mpsc::channel::<DialogRequest>(64);
        let (evt_tx, evt_rx) = mpsc::channel::<SessionEvent>(64);
        let log = self.log.clone();
        let script = self.script.clone();

        match &script {
            Script::Reply { .. } => {}
            Script::Silent => self.held.lock().unwrap().push(evt_tx.clone()),
            Script::OneFrameThenSilent(frame) => {
                evt_tx
                    .try_send(SessionEvent::AudioOut(frame.clone()))
                    .unwrap();
                self.held.lock().unwrap().push(evt_tx.clone());
            }
            Script::Stalled => {
                self.held.lock().unwrap().push(evt_tx);
                self.held_requests.lock().unwrap().push(req_rx);
                return Ok(DialogChannels {
                    requests: req_tx,
                    events: evt_rx,
                });
            }
        }

        tokio::spawn(async move {
            let mut chunks = 0usize;
            while let Some(request) = req_rx.recv().await {
                match request {
                    DialogRequest::Config { prior_state, .. } => {
                        log.lock().unwrap().prior_states.push(prior_state);
                    }
                    DialogRequest::Audio(_) => {
                        chunks += 1;
                        if chunks == END_AFTER_CHUNKS && matches!(script, Script::Reply { .. }) {
                            let _ = evt_tx.send(SessionEvent::UtteranceEnded).await;
                        }
                    }
                }
            }
            log.lock().unwrap().chunks_received.push(chunks);

            if let Script::Reply { result, audio, gap } = script {
                let _ = evt_tx.send(SessionEvent::Result(result)).await;
                for frame in audio {
                    if !gap.is_zero() {
                        tokio::time::sleep(gap).await;
                    }
                    let _ = evt_tx.send(SessionEvent::AudioOut(frame)).await;
                }
            }
        });

        Ok(DialogChannels {
            requests: req_tx,
            events: evt_rx,
        })
    }
}

/// A sine-ish square wave so the encoder has something to chew on.
pub fn response_frame(len: usize) -> Bytes {
    let mut pcm = Vec::with_capacity(len);
    for i in 0..len / 2 {
        let sample: i16 = if (i / 20) % 2 == 0 { 4000 } else { -4000 };
        pcm.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(pcm)
}

// =============================================================================
// Encoding
// =============================================================================

pub struct FailingEncoder;

impl AudioEncoder for FailingEncoder {
    fn encode(&self, _pcm: &[u8]) -> Result<Bytes, TranscodeError> {
        Err(TranscodeError::Encode("lame_encode_buffer returned -1".into()))
    }
}

// =============================================================================
// Publishing
// =============================================================================

#[derive(Default)]
pub struct FakePublisher {
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub fail: bool,
}

impl FakePublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPublisher for FakePublisher {
    async fn publish(&self, mp3: Bytes, device_id: Option<&str>) -> PublishResult<PublishedAudio> {
        if self.fail {
            return Err(PublishError::Upload("AccessDenied".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        let key = build_object_key(Some("responses"), device_id, &uploads.len().to_string());
        uploads.push((key.clone(), mp3.len()));

        let url = Url::parse(&format!(
            "https://bucket.s3.amazonaws.com/{key}?X-Amz-Expires=5&X-Amz-Signature=sig"
        ))
        .unwrap();
        Ok(PublishedAudio {
            object_key: key,
            url,
        })
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub fn complete_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.client_id = Some("client".into());
    config.client_secret = Some("secret".into());
    config.redirect_url = Some("https://example.com/cb".into());
    config.api_endpoint = Some("embeddedassistant.googleapis.com".into());
    config
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub backend: Arc<ScriptedBackend>,
    pub publisher: Arc<FakePublisher>,
}

pub fn harness(config: BridgeConfig, script: Script) -> Harness {
    let synthesizer = Arc::new(FakeSynthesizer::default());
    let backend = Arc::new(ScriptedBackend::new(script));
    let publisher = Arc::new(FakePublisher::default());
    let state = AppState::with_components(
        config,
        synthesizer.clone(),
        backend.clone(),
        publisher.clone(),
    );
    Harness {
        state,
        synthesizer,
        backend,
        publisher,
    }
}
