//! Turn orchestrator tests on tokio's paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use alexa_assistant_bridge::core::assistant::{ConversationState, MicrophoneMode};
use alexa_assistant_bridge::core::audio::{AudioEncoder, Mp3Transcoder};
use alexa_assistant_bridge::core::turn::{
    ConversationContext, TurnOrchestrator, TurnRequest, TurnSettings, TurnState,
};
use alexa_assistant_bridge::errors::TurnError;

use common::{
    END_AFTER_CHUNKS, FailingEncoder, FakePublisher, FakeSynthesizer, Script, ScriptedBackend,
    response_frame,
};

/// Six seconds of speech at 16 kHz: more chunks than the request channel holds.
const LONG_SPEECH_BYTES: usize = 192_000;

struct Rig {
    orchestrator: TurnOrchestrator,
    synthesizer: Arc<FakeSynthesizer>,
    backend: Arc<ScriptedBackend>,
    publisher: Arc<FakePublisher>,
}

fn rig_with(script: Script, synthesizer: FakeSynthesizer, publisher: FakePublisher) -> Rig {
    rig_with_encoder(
        script,
        synthesizer,
        Arc::new(Mp3Transcoder::default()),
        publisher,
    )
}

fn rig_with_encoder(
    script: Script,
    synthesizer: FakeSynthesizer,
    encoder: Arc<dyn AudioEncoder>,
    publisher: FakePublisher,
) -> Rig {
    let synthesizer = Arc::new(synthesizer);
    let backend = Arc::new(ScriptedBackend::new(script));
    let publisher = Arc::new(publisher);
    let orchestrator = TurnOrchestrator::new(
        synthesizer.clone(),
        backend.clone(),
        encoder,
        publisher.clone(),
        TurnSettings::default(),
    );
    Rig {
        orchestrator,
        synthesizer,
        backend,
        publisher,
    }
}

fn rig(script: Script) -> Rig {
    rig_with(script, FakeSynthesizer::default(), FakePublisher::default())
}

fn request(utterance: &str, context: ConversationContext) -> TurnRequest {
    TurnRequest {
        utterance: utterance.to_string(),
        access_token: "ya29.token".to_string(),
        context,
        device_id: Some("kitchen".to_string()),
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_turn_publishes_audio() {
    let rig = rig(Script::reply(
        MicrophoneMode::Open,
        vec![response_frame(3200), response_frame(3200)],
    ));

    let outcome = rig
        .orchestrator
        .run_turn(request("what is the weather", ConversationContext::default()))
        .await
        .unwrap();

    assert_eq!(
        outcome.states,
        vec![
            TurnState::Idle,
            TurnState::SynthesizingSpeech,
            TurnState::StreamingToBackend,
            TurnState::AwaitingBackendResponse,
            TurnState::Transcoding,
            TurnState::Uploading,
            TurnState::Responding,
        ]
    );

    let audio = outcome.audio.expect("published audio");
    assert_eq!(audio.object_key, "responses/kitchen/0.mp3");
    assert!(audio.ssml_url().contains("&amp;"));

    assert_eq!(outcome.request_text.as_deref(), Some("what is the weather"));
    assert_eq!(outcome.response_text.as_deref(), Some("It is sunny"));
    assert!(outcome.context.is_microphone_open());
    assert_eq!(
        outcome.context.conversation_state.as_bytes().as_ref(),
        b"next-state"
    );

    assert_eq!(rig.synthesizer.texts(), vec!["what is the weather"]);
    let uploads = rig.publisher.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].1 > 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_audio_sent_after_end_of_utterance() {
    let rig = rig(Script::reply(MicrophoneMode::Closed, vec![response_frame(640)]));

    rig.orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap();

    // eight chunks were scheduled; the backend stopped listening after three
    assert_eq!(rig.backend.chunks_received(), vec![END_AFTER_CHUNKS]);
}

#[tokio::test(start_paused = true)]
async fn test_prior_state_sent_only_when_present() {
    let rig = rig(Script::reply(MicrophoneMode::Closed, vec![]));

    rig.orchestrator
        .run_turn(request("first", ConversationContext::default()))
        .await
        .unwrap();

    let context = ConversationContext {
        conversation_state: ConversationState::new(Bytes::from_static(b"prior")),
        microphone_mode: MicrophoneMode::Open,
    };
    rig.orchestrator
        .run_turn(request("second", context))
        .await
        .unwrap();

    assert_eq!(
        rig.backend.prior_states(),
        vec![
            None,
            Some(ConversationState::new(Bytes::from_static(b"prior")))
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_response_skips_encoding_and_upload() {
    let rig = rig(Script::reply(MicrophoneMode::Closed, vec![]));

    let outcome = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap();

    assert!(outcome.audio.is_none());
    assert!(rig.publisher.uploads().is_empty());
    assert!(!outcome.states.contains(&TurnState::Transcoding));
    assert_eq!(outcome.states.last(), Some(&TurnState::Responding));
}

#[tokio::test(start_paused = true)]
async fn test_silent_backend_times_out() {
    let rig = rig(Script::Silent);
    let start = Instant::now();

    let err = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::BackendTimeout(_)));
    assert!(err.spoken_message().contains("did not respond"));

    // paced send time (0.5 s) plus the 10 s grace period
    let elapsed = Instant::now() - start;
    assert!(elapsed >= Duration::from_millis(10_500));
    assert!(elapsed < Duration::from_secs(11));
    assert!(rig.publisher.uploads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_audio_out_keeps_turn_alive() {
    let rig = rig(Script::Reply {
        result: Default::default(),
        audio: vec![response_frame(640), response_frame(640), response_frame(640)],
        gap: Duration::from_secs(8),
    });

    let outcome = rig
        .orchestrator
        .run_turn(request("tell me a story", ConversationContext::default()))
        .await
        .unwrap();

    // 24 s of backend activity, never more than 8 s apart
    assert!(outcome.audio.is_some());
    assert!(!outcome.context.is_microphone_open());
}

#[tokio::test(start_paused = true)]
async fn test_synthesis_failure_ends_turn() {
    let rig = rig_with(
        Script::reply(MicrophoneMode::Closed, vec![]),
        FakeSynthesizer::failing(),
        FakePublisher::default(),
    );

    let err = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Synthesis(_)));
    assert_eq!(rig.backend.opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_mentions_storage() {
    let rig = rig_with(
        Script::reply(MicrophoneMode::Closed, vec![response_frame(640)]),
        FakeSynthesizer::default(),
        FakePublisher::failing(),
    );

    let err = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Upload(_)));
    assert!(err.spoken_message().contains("S3 bucket"));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_backend_still_times_out() {
    let rig = rig_with(
        Script::Stalled,
        FakeSynthesizer::with_speech_bytes(LONG_SPEECH_BYTES),
        FakePublisher::default(),
    );
    let start = Instant::now();

    let result = tokio::time::timeout(
        Duration::from_secs(120),
        rig.orchestrator
            .run_turn(request("tell me a long story", ConversationContext::default())),
    )
    .await
    .expect("turn must not hang on a backend that stops reading");

    assert!(matches!(result, Err(TurnError::BackendTimeout(_))));

    // six seconds of paced speech plus the 10 s grace period
    let elapsed = Instant::now() - start;
    assert!(elapsed >= Duration::from_secs(16));
    assert!(elapsed < Duration::from_secs(17));
}

#[tokio::test(start_paused = true)]
async fn test_early_audio_does_not_shorten_deadline() {
    let rig = rig_with(
        Script::OneFrameThenSilent(response_frame(640)),
        FakeSynthesizer::with_speech_bytes(LONG_SPEECH_BYTES),
        FakePublisher::default(),
    );
    let start = Instant::now();

    let err = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::BackendTimeout(_)));
    let elapsed = Instant::now() - start;
    assert!(elapsed >= Duration::from_secs(16), "fired after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(17));
}

#[tokio::test(start_paused = true)]
async fn test_encoding_failure_ends_in_error() {
    let rig = rig_with_encoder(
        Script::reply(MicrophoneMode::Closed, vec![response_frame(640)]),
        FakeSynthesizer::default(),
        Arc::new(FailingEncoder),
        FakePublisher::default(),
    );

    let err = rig
        .orchestrator
        .run_turn(request("hello", ConversationContext::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Encoding(_)));
    assert!(err.spoken_message().contains("problem preparing"));
    assert!(rig.publisher.uploads().is_empty());
}
