//! Amazon Polly speech synthesis adapter.
//!
//! Requests 16-bit PCM from Polly's SynthesizeSpeech API via the AWS SDK and
//! appends trailing silence. The client is built lazily on first use and
//! shared afterwards.
//!
//! # Authentication
//!
//! 1. `aws_access_key_id` / `aws_secret_access_key` in config
//! 2. Otherwise the default AWS credential chain (environment, profile, IAM role)

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_polly::Client as PollyClient;
use aws_sdk_polly::config::Builder as PollyConfigBuilder;
use aws_sdk_polly::types::{Engine, OutputFormat, TextType, VoiceId};
use bytes::{Bytes, BytesMut};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::config::{AwsPollyTTSConfig, MAX_TEXT_LENGTH, PollyEngine, PollyVoice};
use crate::core::audio::PcmFormat;
use crate::core::tts::base::{SpeechSynthesizer, TTSError, TTSResult};

fn engine_to_sdk(engine: PollyEngine) -> Engine {
    match engine {
        PollyEngine::Standard => Engine::Standard,
        PollyEngine::Neural => Engine::Neural,
        PollyEngine::LongForm => Engine::LongForm,
        PollyEngine::Generative => Engine::Generative,
    }
}

fn voice_to_sdk(voice: &PollyVoice) -> VoiceId {
    match voice {
        PollyVoice::Joanna => VoiceId::Joanna,
        PollyVoice::Matthew => VoiceId::Matthew,
        PollyVoice::Salli => VoiceId::Salli,
        PollyVoice::Kendra => VoiceId::Kendra,
        PollyVoice::Kimberly => VoiceId::Kimberly,
        PollyVoice::Joey => VoiceId::Joey,
        PollyVoice::Ivy => VoiceId::Ivy,
        PollyVoice::Justin => VoiceId::Justin,
        PollyVoice::Amy => VoiceId::Amy,
        PollyVoice::Brian => VoiceId::Brian,
        PollyVoice::Emma => VoiceId::Emma,
        PollyVoice::Custom(id) => VoiceId::from(id.as_str()),
    }
}

/// Amazon Polly implementation of [`SpeechSynthesizer`].
pub struct AwsPollyTTS {
    config: AwsPollyTTSConfig,
    client: OnceCell<PollyClient>,
    request_counter: Arc<AtomicU64>,
}

impl AwsPollyTTS {
    pub fn new(config: AwsPollyTTSConfig) -> TTSResult<Self> {
        config.validate().map_err(TTSError::InvalidConfiguration)?;

        Ok(Self {
            config,
            client: OnceCell::new(),
            request_counter: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn config(&self) -> &AwsPollyTTSConfig {
        &self.config
    }

    /// PCM layout of the audio this adapter returns.
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: self.config.sample_rate,
            ..PcmFormat::default()
        }
    }

    async fn client(&self) -> TTSResult<&PollyClient> {
        self.client.get_or_try_init(|| self.init_client()).await
    }

    async fn init_client(&self) -> TTSResult<PollyClient> {
        let region = Region::new(self.config.region.clone());

        info!(
            region = %self.config.region,
            voice = %self.config.voice,
            engine = %self.config.engine,
            "Initializing Amazon Polly client"
        );

        if self.config.has_explicit_credentials() {
            let access_key = self
                .config
                .aws_access_key_id
                .as_ref()
                .ok_or_else(|| TTSError::InvalidConfiguration("Missing AWS access key".into()))?;
            let secret_key = self
                .config
                .aws_secret_access_key
                .as_ref()
                .ok_or_else(|| TTSError::InvalidConfiguration("Missing AWS secret key".into()))?;

            let credentials = Credentials::new(
                access_key,
                secret_key,
                self.config.aws_session_token.clone(),
                None,
                "alexa-assistant-bridge",
            );

            let polly_config = PollyConfigBuilder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
                .build();

            return Ok(PollyClient::from_conf(polly_config));
        }

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        Ok(PollyClient::new(&aws_config))
    }

    /// Appends the configured trailing silence to `speech`.
    pub fn with_trailing_silence(&self, speech: Bytes) -> Bytes {
        let silence = self
            .pcm_format()
            .silence(Duration::from_millis(self.config.trailing_silence_ms));
        if silence.is_empty() {
            return speech;
        }
        let mut out = BytesMut::with_capacity(speech.len() + silence.len());
        out.extend_from_slice(&speech);
        out.extend_from_slice(&silence);
        out.freeze()
    }
}

#[async_trait]
impl SpeechSynthesizer for AwsPollyTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Cannot synthesize empty text".into(),
            ));
        }
        if text.len() > MAX_TEXT_LENGTH {
            return Err(TTSError::InvalidConfiguration(format!(
                "Text length {} exceeds maximum {} characters",
                text.len(),
                MAX_TEXT_LENGTH
            )));
        }

        let client = self.client().await?;
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;

        debug!(
            request_id,
            text_len = text.len(),
            voice = %self.config.voice,
            "Synthesizing utterance with Amazon Polly"
        );

        let response = client
            .synthesize_speech()
            .text(text)
            .text_type(TextType::Text)
            .voice_id(voice_to_sdk(&self.config.voice))
            .engine(engine_to_sdk(self.config.engine))
            .output_format(OutputFormat::Pcm)
            .sample_rate(self.config.sample_rate.to_string())
            .send()
            .await
            .map_err(|e| {
                error!(request_id, error = %e, "Polly API error");
                TTSError::ProviderError(format!("Polly API error: {e}"))
            })?;

        let audio = response.audio_stream.collect().await.map_err(|e| {
            error!(request_id, error = %e, "Failed to read Polly audio stream");
            TTSError::AudioGenerationFailed(format!("Failed to read audio stream: {e}"))
        })?;
        let speech = audio.into_bytes();

        debug!(request_id, audio_bytes = speech.len(), "Polly synthesis complete");

        Ok(self.with_trailing_silence(speech))
    }

    fn provider_name(&self) -> &'static str {
        "aws-polly"
    }
}
