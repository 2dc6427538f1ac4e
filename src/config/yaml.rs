use serde::Deserialize;
use std::path::PathBuf;

use super::BridgeConfig;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///
/// google:
///   client_id: "1234.apps.googleusercontent.com"
///   client_secret: "your-client-secret"
///   redirect_url: "https://layla.amazon.com/api/skill/link/XXXX"
///   api_endpoint: "embeddedassistant.googleapis.com"
///   device_id: "kitchen-echo"
///
/// alexa:
///   app_id: "amzn1.ask.skill.0000"
///   debug_mode: false
///
/// audio:
///   chunk_size: 2048
///   send_speed: 1.0
///   trailing_silence_ms: 1000
///   backend_timeout_secs: 10
///
/// polly:
///   voice: "Joanna"
///   engine: "neural"
///
/// storage:
///   s3_bucket: "alexa-assistant-bridge"
///   s3_prefix: "responses"
///   region: "us-east-1"
///
/// rate_limit:
///   requests_per_second: 60
///   burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub google: Option<GoogleYaml>,
    pub alexa: Option<AlexaYaml>,
    pub audio: Option<AudioYaml>,
    pub polly: Option<PollyYaml>,
    pub storage: Option<StorageYaml>,
    pub rate_limit: Option<RateLimitYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Google Assistant credentials and endpoint
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoogleYaml {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub api_endpoint: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AlexaYaml {
    pub app_id: Option<String>,
    pub debug_mode: Option<bool>,
    pub utterance_override: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub chunk_size: Option<usize>,
    pub send_speed: Option<f64>,
    pub trailing_silence_ms: Option<u64>,
    pub backend_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PollyYaml {
    pub voice: Option<String>,
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageYaml {
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub s3_endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RateLimitYaml {
    pub requests_per_second: Option<u32>,
    pub burst_size: Option<u32>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_opt<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }

    /// Overrides `config` with every value present in this file.
    pub fn apply_to(self, config: &mut BridgeConfig) {
        if let Some(server) = self.server {
            set(&mut config.host, server.host);
            set(&mut config.port, server.port);
        }
        if let Some(google) = self.google {
            set_opt(&mut config.client_id, google.client_id);
            set_opt(&mut config.client_secret, google.client_secret);
            set_opt(&mut config.redirect_url, google.redirect_url);
            set_opt(&mut config.api_endpoint, google.api_endpoint);
            set_opt(&mut config.device_id, google.device_id);
        }
        if let Some(alexa) = self.alexa {
            set_opt(&mut config.alexa_app_id, alexa.app_id);
            set(&mut config.debug_mode, alexa.debug_mode);
            set_opt(&mut config.utterance_override, alexa.utterance_override);
        }
        if let Some(audio) = self.audio {
            set(&mut config.chunk_size, audio.chunk_size);
            set(&mut config.send_speed, audio.send_speed);
            set(&mut config.trailing_silence_ms, audio.trailing_silence_ms);
            set(&mut config.backend_timeout_secs, audio.backend_timeout_secs);
        }
        if let Some(polly) = self.polly {
            set(&mut config.polly_voice, polly.voice);
            set(&mut config.polly_engine, polly.engine);
        }
        if let Some(storage) = self.storage {
            set(&mut config.s3_bucket, storage.s3_bucket);
            set_opt(&mut config.s3_prefix, storage.s3_prefix);
            set_opt(&mut config.s3_endpoint, storage.s3_endpoint);
            set(&mut config.aws_region, storage.region);
            set_opt(&mut config.aws_access_key_id, storage.access_key_id);
            set_opt(&mut config.aws_secret_access_key, storage.secret_access_key);
        }
        if let Some(rate_limit) = self.rate_limit {
            set(
                &mut config.rate_limit_requests_per_second,
                rate_limit.requests_per_second,
            );
            set(&mut config.rate_limit_burst_size, rate_limit.burst_size);
        }
    }
}
