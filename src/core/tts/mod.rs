pub mod aws_polly;
mod base;

pub use aws_polly::{AwsPollyTTS, AwsPollyTTSConfig, PollyEngine, PollyVoice};
pub use base::{SpeechSynthesizer, TTSError, TTSResult};
