pub mod assistant;
pub mod audio;
pub mod publisher;
pub mod tts;
pub mod turn;

// Re-export commonly used types for convenience
pub use assistant::{
    AssistantError, ConversationSession, ConversationState, DialogBackend, GoogleAssistantBackend,
    MicrophoneMode, SessionEvent,
};
pub use audio::{AudioChunker, Mp3Transcoder, PcmFormat, ResponseRecorder, TranscodeOptions};
pub use publisher::{AudioPublisher, ObjectStorePublisher, PublishError, PublishedAudio};
pub use tts::{AwsPollyTTS, AwsPollyTTSConfig, SpeechSynthesizer, TTSError};
pub use turn::{
    ConversationContext, SessionStore, TurnOrchestrator, TurnOutcome, TurnRequest, TurnSettings,
    TurnState,
};
