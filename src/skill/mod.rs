//! Voice-skill boundary: request/response envelopes and intent dispatch.

pub mod dispatcher;
pub mod request;
pub mod response;

pub use dispatcher::{SkillDispatcher, SkillError, control_utterance};
pub use request::{Intent, RequestEnvelope, SkillRequest};
pub use response::{Card, OutputSpeech, ResponseEnvelope};
