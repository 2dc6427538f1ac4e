use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors raised by speech synthesis providers.
#[derive(Debug, Error)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Provider not ready: {0}")]
    ProviderNotReady(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Text in, raw PCM out.
///
/// Implementations return 16-bit little-endian mono PCM at the sample rate
/// they were configured with, trailing silence included.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes>;

    /// Provider name used in logs.
    fn provider_name(&self) -> &'static str;
}
