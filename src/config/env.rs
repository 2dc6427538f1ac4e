use std::env;
use std::str::FromStr;

use super::BridgeConfig;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: {e}")),
        None => Ok(None),
    }
}

pub(super) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Environment variables over defaults.
pub(super) fn load_from_env() -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let mut config = BridgeConfig::default();

    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_var("PORT")? {
        config.port = port;
    }

    config.client_id = var("CLIENT_ID");
    config.client_secret = var("CLIENT_SECRET");
    config.redirect_url = var("REDIRECT_URL");
    config.api_endpoint = var("API_ENDPOINT");
    config.device_id = var("DEVICE_ID");

    config.alexa_app_id = var("ALEXA_APP_ID");
    config.debug_mode = var("DEBUG_MODE").is_some_and(|v| parse_bool(&v));
    config.utterance_override = var("UTTERANCE_OVERRIDE");

    if let Some(chunk_size) = parse_var("CHUNK_SIZE")? {
        config.chunk_size = chunk_size;
    }
    if let Some(send_speed) = parse_var("SEND_SPEED")? {
        config.send_speed = send_speed;
    }
    if let Some(silence) = parse_var("TRAILING_SILENCE_MS")? {
        config.trailing_silence_ms = silence;
    }
    if let Some(timeout) = parse_var("BACKEND_TIMEOUT_SECS")? {
        config.backend_timeout_secs = timeout;
    }

    if let Some(voice) = var("POLLY_VOICE") {
        config.polly_voice = voice;
    }
    if let Some(engine) = var("POLLY_ENGINE") {
        config.polly_engine = engine;
    }

    if let Some(bucket) = var("S3_BUCKET") {
        config.s3_bucket = bucket;
    }
    config.s3_prefix = var("S3_PREFIX");
    config.s3_endpoint = var("S3_ENDPOINT");

    if let Some(region) = var("AWS_REGION") {
        config.aws_region = region;
    }
    config.aws_access_key_id = var("AWS_ACCESS_KEY_ID");
    config.aws_secret_access_key = var("AWS_SECRET_ACCESS_KEY");
    config.aws_session_token = var("AWS_SESSION_TOKEN");

    if let Some(rps) = parse_var("RATE_LIMIT_REQUESTS_PER_SECOND")? {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = parse_var("RATE_LIMIT_BURST_SIZE")? {
        config.rate_limit_burst_size = burst;
    }

    Ok(config)
}
