use super::BridgeConfig;

/// Checks values that would break every turn. Required per-turn values are
/// not checked here.
pub(super) fn validate(config: &BridgeConfig) -> Result<(), String> {
    if config.chunk_size == 0 {
        return Err("CHUNK_SIZE must be greater than zero".to_string());
    }
    if !config.send_speed.is_finite() || config.send_speed <= 0.0 {
        return Err(format!(
            "SEND_SPEED must be a positive number, got {}",
            config.send_speed
        ));
    }
    if config.backend_timeout_secs == 0 {
        return Err("BACKEND_TIMEOUT_SECS must be greater than zero".to_string());
    }
    if config.s3_bucket.trim().is_empty() {
        return Err("S3_BUCKET must not be empty".to_string());
    }
    if config.aws_access_key_id.is_some() != config.aws_secret_access_key.is_some() {
        return Err(
            "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
        );
    }
    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err("Rate limit values must be greater than zero".to_string());
    }
    Ok(())
}
