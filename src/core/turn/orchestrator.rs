//! Turn Orchestrator
//!
//! Drives one utterance through the pipeline:
//!
//! ```text
//! Idle → SynthesizingSpeech → StreamingToBackend → AwaitingBackendResponse
//!      → Transcoding → Uploading → Responding
//! ```
//!
//! Any step may end in `Error`. While streaming, three sources are
//! multiplexed with `tokio::select!`: the paced audio schedule, inbound
//! session events and the guard timer's cancellation token.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::context::ConversationContext;
use super::guard::GuardTimer;
use super::timings::{Stopwatch, TurnTimings};
use crate::core::assistant::{
    AudioInSpec, AudioOutSpec, ConversationSession, DialogBackend, DialogResult, SessionEvent,
};
use crate::core::audio::{
    AudioChunker, AudioEncoder, DEFAULT_CHUNK_SIZE, PcmFormat, ResponseRecorder, TranscodeError,
    paced,
};
use crate::core::publisher::{AudioPublisher, PublishedAudio};
use crate::core::tts::SpeechSynthesizer;
use crate::errors::{TurnError, TurnResult};

/// Default grace period for the guard timer.
pub const DEFAULT_BACKEND_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    SynthesizingSpeech,
    StreamingToBackend,
    AwaitingBackendResponse,
    Transcoding,
    Uploading,
    Responding,
    Error,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SynthesizingSpeech => "synthesizing_speech",
            Self::StreamingToBackend => "streaming_to_backend",
            Self::AwaitingBackendResponse => "awaiting_backend_response",
            Self::Transcoding => "transcoding",
            Self::Uploading => "uploading",
            Self::Responding => "responding",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Responding | Self::Error)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pacing and timeout knobs shared by all turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnSettings {
    pub format: PcmFormat,
    pub chunk_size: usize,
    pub send_speed: f64,
    pub backend_grace: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            format: PcmFormat::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            send_speed: 1.0,
            backend_grace: DEFAULT_BACKEND_GRACE,
        }
    }
}

/// Input to one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub utterance: String,
    pub access_token: String,
    pub context: ConversationContext,
    pub device_id: Option<String>,
}

/// What a successful turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// `None` when the backend returned no audio at all.
    pub audio: Option<PublishedAudio>,
    pub request_text: Option<String>,
    pub response_text: Option<String>,
    /// Context to store for the next turn of this session.
    pub context: ConversationContext,
    pub timings: TurnTimings,
    /// States visited, in order.
    pub states: Vec<TurnState>,
}

/// Per-turn bookkeeping. Never shared between turns.
struct Turn {
    state: TurnState,
    states: Vec<TurnState>,
}

impl Turn {
    fn new() -> Self {
        Self {
            state: TurnState::Idle,
            states: vec![TurnState::Idle],
        }
    }

    fn advance(&mut self, next: TurnState) {
        debug!(from = %self.state, to = %next, "Turn state transition");
        self.state = next;
        self.states.push(next);
    }

    fn fail(&mut self, err: TurnError) -> TurnError {
        error!(state = %self.state, error = %err, "Turn failed");
        self.advance(TurnState::Error);
        err
    }
}

pub struct TurnOrchestrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    backend: Arc<dyn DialogBackend>,
    encoder: Arc<dyn AudioEncoder>,
    publisher: Arc<dyn AudioPublisher>,
    settings: TurnSettings,
}

impl TurnOrchestrator {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        backend: Arc<dyn DialogBackend>,
        encoder: Arc<dyn AudioEncoder>,
        publisher: Arc<dyn AudioPublisher>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            synthesizer,
            backend,
            encoder,
            publisher,
            settings,
        }
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Runs one turn to a terminal state.
    pub async fn run_turn(&self, request: TurnRequest) -> TurnResult<TurnOutcome> {
        let mut turn = Turn::new();
        let mut timings = TurnTimings::default();
        let mut watch = Stopwatch::start();

        info!(
            utterance_len = request.utterance.len(),
            device_id = request.device_id.as_deref().unwrap_or("-"),
            prior_state_len = request.context.conversation_state.len(),
            "Starting turn"
        );

        // Speech synthesis
        turn.advance(TurnState::SynthesizingSpeech);
        let speech = match self.synthesizer.synthesize(&request.utterance).await {
            Ok(speech) => speech,
            Err(e) => return Err(turn.fail(e.into())),
        };
        timings.synthesis_ms = watch.lap();
        debug!(
            provider = self.synthesizer.provider_name(),
            bytes = speech.len(),
            elapsed_ms = timings.synthesis_ms,
            "Speech synthesized"
        );

        // Session setup
        let mut session = match ConversationSession::open(
            self.backend.as_ref(),
            &request.access_token,
            request.context.conversation_state.clone(),
        )
        .await
        {
            Ok(session) => session,
            Err(e) => return Err(turn.fail(e.into())),
        };
        let audio_in = AudioInSpec {
            format: self.settings.format,
        };
        let audio_out = AudioOutSpec {
            format: self.settings.format,
            ..Default::default()
        };
        if let Err(e) = session.send_config(audio_in, audio_out).await {
            return Err(turn.fail(e.into()));
        }
        timings.setup_ms = watch.lap();

        // Streaming
        turn.advance(TurnState::StreamingToBackend);
        let mut chunker = AudioChunker::new(
            self.settings.format,
            self.settings.chunk_size,
            self.settings.send_speed,
        );
        let schedule = chunker.push_batch(speech);
        let paced_duration = chunker.next_batch_start();
        let grace = self.settings.backend_grace;

        let start = Instant::now();
        let guard = GuardTimer::arm(start + paced_duration + grace);
        let cancelled = guard.token();
        let mut chunks = Box::pin(paced(start, schedule));
        let mut chunks_done = false;
        let mut recorder = ResponseRecorder::for_format(&self.settings.format);
        let mut result = DialogResult::default();
        let mut last_error: Option<String> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancelled.cancelled() => {
                    recorder.discard();
                    session.close();
                    warn!(
                        chunks_sent = session.chunks_sent(),
                        last_error = last_error.as_deref().unwrap_or("-"),
                        "Dialog backend timed out"
                    );
                    return Err(turn.fail(TurnError::BackendTimeout(grace)));
                }

                event = session.next_event() => match event {
                    SessionEvent::UtteranceEnded => {
                        timings.send_ms = watch.lap();
                        turn.advance(TurnState::AwaitingBackendResponse);
                    }
                    SessionEvent::Result(update) => {
                        debug!(
                            has_request_text = update.request_text.is_some(),
                            has_response_text = update.response_text.is_some(),
                            microphone_mode = ?update.microphone_mode,
                            "Dialog result received"
                        );
                        merge_result(&mut result, update);
                    }
                    SessionEvent::AudioOut(bytes) => {
                        recorder.accept(&bytes);
                        let deadline = Instant::now() + grace;
                        if chunks_done {
                            guard.reset(deadline);
                        } else {
                            // never earlier than the end of the paced send
                            guard.extend(deadline);
                        }
                    }
                    SessionEvent::Error(cause) => {
                        warn!(cause = %cause, "Dialog stream error");
                        last_error = Some(cause);
                    }
                    SessionEvent::Ended => {
                        guard.disarm();
                        break;
                    }
                },

                chunk = chunks.next(), if !chunks_done && session.is_sending() => match chunk {
                    Some(data) => {
                        // a stalled backend stops draining requests; the
                        // write must still yield to the guard
                        tokio::select! {
                            biased;
                            _ = cancelled.cancelled() => {}
                            _ = session.send_audio_chunk(data) => {}
                        }
                    }
                    None => {
                        chunks_done = true;
                        debug!(chunks_sent = session.chunks_sent(), "All audio chunks sent");
                    }
                },
            }
        }

        if turn.state == TurnState::StreamingToBackend {
            timings.send_ms = watch.lap();
        } else {
            timings.wait_ms = watch.lap();
        }
        drop(session);
        drop(guard);

        let mut context = request.context.clone();
        context.apply(&result);

        let pcm = recorder.finalize();
        info!(
            response_bytes = pcm.len(),
            microphone_open = context.is_microphone_open(),
            "Dialog backend finished"
        );

        if pcm.is_empty() {
            if let Some(cause) = &last_error {
                warn!(cause = %cause, "No audio returned after stream error");
            }
            turn.advance(TurnState::Responding);
            return Ok(TurnOutcome {
                audio: None,
                request_text: result.request_text,
                response_text: result.response_text,
                context,
                timings,
                states: turn.states,
            });
        }

        // Encoding
        turn.advance(TurnState::Transcoding);
        let encoder = self.encoder.clone();
        let encoded = tokio::task::spawn_blocking(move || encoder.encode(&pcm))
            .await
            .map_err(|e| TurnError::Encoding(TranscodeError::Encode(e.to_string())))
            .and_then(|r| r.map_err(TurnError::from));
        let mp3 = match encoded {
            Ok(mp3) => mp3,
            Err(e) => return Err(turn.fail(e)),
        };
        timings.encode_ms = watch.lap();

        // Upload
        turn.advance(TurnState::Uploading);
        let published = match self
            .publisher
            .publish(mp3, request.device_id.as_deref())
            .await
        {
            Ok(published) => published,
            Err(e) => return Err(turn.fail(e.into())),
        };
        timings.upload_ms = watch.lap();

        turn.advance(TurnState::Responding);
        info!(
            object_key = %published.object_key,
            total_ms = timings.total_ms(),
            "Turn complete"
        );

        Ok(TurnOutcome {
            audio: Some(published),
            request_text: result.request_text,
            response_text: result.response_text,
            context,
            timings,
            states: turn.states,
        })
    }
}

/// Later results only overwrite the fields they carry.
fn merge_result(into: &mut DialogResult, update: DialogResult) {
    if update.request_text.is_some() {
        into.request_text = update.request_text;
    }
    if update.response_text.is_some() {
        into.response_text = update.response_text;
    }
    if update.microphone_mode.is_some() {
        into.microphone_mode = update.microphone_mode;
    }
    if update.conversation_state.is_some() {
        into.conversation_state = update.conversation_state;
    }
}
