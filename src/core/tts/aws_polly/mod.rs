//! Amazon Polly speech synthesis.
//!
//! Turns the user's utterance into 16 kHz, 16-bit mono PCM that can be paced
//! directly into the assistant's audio-in stream. The AWS SDK handles request
//! signing and credential resolution.

mod config;
mod provider;


pub use config::{
    AwsPollyTTSConfig, DEFAULT_TRAILING_SILENCE_MS, MAX_TEXT_LENGTH, PCM_SAMPLE_RATES,
    PollyEngine, PollyVoice,
};
pub use provider::AwsPollyTTS;
