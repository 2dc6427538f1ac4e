//! Configuration types for Amazon Polly speech synthesis.
//!
//! The bridge always asks Polly for raw PCM so the audio can be paced
//! straight into the assistant stream; only voice, engine, sample rate and
//! credentials are configurable.

use serde::{Deserialize, Serialize};

/// Maximum characters Polly accepts in one SynthesizeSpeech call.
pub const MAX_TEXT_LENGTH: usize = 3000;

/// Sample rates Polly supports for PCM output.
pub const PCM_SAMPLE_RATES: &[u32] = &[8000, 16000];

/// Default silence appended after the synthesized utterance.
pub const DEFAULT_TRAILING_SILENCE_MS: u64 = 1000;

/// Amazon Polly synthesis engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollyEngine {
    #[serde(rename = "standard")]
    Standard,
    #[default]
    #[serde(rename = "neural")]
    Neural,
    #[serde(rename = "long-form")]
    LongForm,
    #[serde(rename = "generative")]
    Generative,
}

impl PollyEngine {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Neural => "neural",
            Self::LongForm => "long-form",
            Self::Generative => "generative",
        }
    }

    /// Parse from string, with fallback to Neural.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "standard" => Self::Standard,
            "neural" => Self::Neural,
            "long-form" | "longform" | "long_form" => Self::LongForm,
            "generative" => Self::Generative,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for PollyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polly voice identifier.
///
/// The common English voices are named; anything else passes through as
/// `Custom` and is validated by Polly itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollyVoice {
    #[default]
    Joanna,
    Matthew,
    Salli,
    Kendra,
    Kimberly,
    Joey,
    Ivy,
    Justin,
    Amy,
    Brian,
    Emma,
    Custom(String),
}

impl PollyVoice {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Joanna => "Joanna",
            Self::Matthew => "Matthew",
            Self::Salli => "Salli",
            Self::Kendra => "Kendra",
            Self::Kimberly => "Kimberly",
            Self::Joey => "Joey",
            Self::Ivy => "Ivy",
            Self::Justin => "Justin",
            Self::Amy => "Amy",
            Self::Brian => "Brian",
            Self::Emma => "Emma",
            Self::Custom(id) => id.as_str(),
        }
    }

    /// Case-insensitive parse; empty input gives the default voice.
    pub fn from_str_or_default(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Self::default(),
            "joanna" => Self::Joanna,
            "matthew" => Self::Matthew,
            "salli" => Self::Salli,
            "kendra" => Self::Kendra,
            "kimberly" => Self::Kimberly,
            "joey" => Self::Joey,
            "ivy" => Self::Ivy,
            "justin" => Self::Justin,
            "amy" => Self::Amy,
            "brian" => Self::Brian,
            "emma" => Self::Emma,
            _ => Self::Custom(trimmed.to_string()),
        }
    }
}

impl std::fmt::Display for PollyVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polly adapter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AwsPollyTTSConfig {
    pub voice: PollyVoice,
    pub engine: PollyEngine,
    pub sample_rate: u32,
    pub region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    /// Silence appended so the assistant detects the end of the utterance.
    pub trailing_silence_ms: u64,
}

impl Default for AwsPollyTTSConfig {
    fn default() -> Self {
        Self {
            voice: PollyVoice::default(),
            engine: PollyEngine::default(),
            sample_rate: 16000,
            region: "us-east-1".to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            trailing_silence_ms: DEFAULT_TRAILING_SILENCE_MS,
        }
    }
}

impl AwsPollyTTSConfig {
    pub fn has_explicit_credentials(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !PCM_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(format!(
                "Sample rate {} not supported for PCM output (expected one of {:?})",
                self.sample_rate, PCM_SAMPLE_RATES
            ));
        }
        if self.region.trim().is_empty() {
            return Err("AWS region must not be empty".to_string());
        }
        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(
                "AWS access key id and secret access key must be provided together".to_string(),
            );
        }
        if let PollyVoice::Custom(id) = &self.voice {
            if id.trim().is_empty() {
                return Err("Voice id must not be empty".to_string());
            }
        }
        Ok(())
    }
}
