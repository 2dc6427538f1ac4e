//! Dialog backend: the Google Assistant embedded `Converse` stream.
//!
//! - `base`: backend seam and typed request/event enums
//! - `messages`: protobuf wire messages
//! - `grpc`: tonic transport implementing [`DialogBackend`]
//! - `session`: per-turn [`ConversationSession`] with send gating

mod base;
pub mod grpc;
pub mod messages;
mod session;

pub use base::{
    AssistantError, AssistantResult, AudioInSpec, AudioOutSpec, ConversationState, DialogBackend,
    DialogChannels, DialogRequest, DialogResult, MicrophoneMode, SessionEvent,
};
pub use grpc::GoogleAssistantBackend;
pub use session::ConversationSession;
