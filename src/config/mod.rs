//! Configuration module for the bridge server
//!
//! Configuration comes from a `.env` file, environment variables and an
//! optional YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading and overrides
//! - `validation`: Value checks run at load time
//!
//! The four values every turn needs (client id, client secret, redirect URL
//! and API endpoint) are deliberately not checked at load time. The server
//! starts without them and each turn reports the first missing one as a
//! spoken error, see [`BridgeConfig::check_turn_requirements`].
//!
//! # Example
//! ```rust,no_run
//! use alexa_assistant_bridge::config::BridgeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod validation;
mod yaml;

use crate::core::audio::{DEFAULT_CHUNK_SIZE, PcmFormat};
use crate::core::publisher::{DEFAULT_URL_EXPIRY, S3PublisherConfig};
use crate::core::tts::{AwsPollyTTSConfig, PollyEngine, PollyVoice};
use crate::core::turn::TurnSettings;
use crate::errors::TurnError;

pub use yaml::YamlConfig;

pub const DEFAULT_S3_BUCKET: &str = "alexa-assistant-bridge";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Server configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,

    // Google Assistant
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub api_endpoint: Option<String>,
    pub device_id: Option<String>,

    // Skill
    /// Requests from any other skill id are rejected when set
    pub alexa_app_id: Option<String>,
    pub debug_mode: bool,
    /// Literal text that replaces whatever the user said
    pub utterance_override: Option<String>,

    // Audio pipeline
    pub chunk_size: usize,
    pub send_speed: f64,
    pub trailing_silence_ms: u64,
    pub backend_timeout_secs: u64,

    // Amazon Polly
    pub polly_voice: String,
    pub polly_engine: String,

    // Storage
    pub s3_bucket: String,
    pub s3_prefix: Option<String>,
    pub s3_endpoint: Option<String>,

    // AWS
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,

    // Rate limiting
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            client_id: None,
            client_secret: None,
            redirect_url: None,
            api_endpoint: None,
            device_id: None,
            alexa_app_id: None,
            debug_mode: false,
            utterance_override: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            send_speed: 1.0,
            trailing_silence_ms: 1000,
            backend_timeout_secs: 10,
            polly_voice: PollyVoice::default().to_string(),
            polly_engine: PollyEngine::default().to_string(),
            s3_bucket: DEFAULT_S3_BUCKET.to_string(),
            s3_prefix: None,
            s3_endpoint: None,
            aws_region: DEFAULT_AWS_REGION.to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Zeroize secrets when the configuration is dropped.
impl Drop for BridgeConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut secret) = self.client_secret {
            secret.zeroize();
        }
        if let Some(ref mut key) = self.aws_access_key_id {
            key.zeroize();
        }
        if let Some(ref mut secret) = self.aws_secret_access_key {
            secret.zeroize();
        }
        if let Some(ref mut token) = self.aws_session_token {
            token.zeroize();
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl BridgeConfig {
    /// Load configuration from environment variables (and `.env`, which
    /// `main` loads first).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variables as the base and the
    /// YAML file's values on top.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = env::load_from_env()?;
        yaml_config.apply_to(&mut config);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// First missing value a turn needs, in the order the user hears them.
    pub fn check_turn_requirements(&self) -> Result<(), TurnError> {
        if !is_set(&self.client_id) {
            return Err(TurnError::Configuration("Client ID"));
        }
        if !is_set(&self.client_secret) {
            return Err(TurnError::Configuration("Client Secret"));
        }
        if !is_set(&self.redirect_url) {
            return Err(TurnError::Configuration("Redirect URL"));
        }
        if !is_set(&self.api_endpoint) {
            return Err(TurnError::Configuration("API endpoint"));
        }
        Ok(())
    }

    pub fn backend_grace(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            format: PcmFormat::default(),
            chunk_size: self.chunk_size,
            send_speed: self.send_speed,
            backend_grace: self.backend_grace(),
        }
    }

    pub fn polly_config(&self) -> AwsPollyTTSConfig {
        AwsPollyTTSConfig {
            voice: PollyVoice::from_str_or_default(&self.polly_voice),
            engine: PollyEngine::from_str_or_default(&self.polly_engine),
            sample_rate: PcmFormat::default().sample_rate,
            region: self.aws_region.clone(),
            aws_access_key_id: self.aws_access_key_id.clone(),
            aws_secret_access_key: self.aws_secret_access_key.clone(),
            aws_session_token: self.aws_session_token.clone(),
            trailing_silence_ms: self.trailing_silence_ms,
        }
    }

    pub fn s3_config(&self) -> S3PublisherConfig {
        S3PublisherConfig {
            bucket: self.s3_bucket.clone(),
            region: self.aws_region.clone(),
            prefix: self.s3_prefix.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            session_token: self.aws_session_token.clone(),
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }
}
