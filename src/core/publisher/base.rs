use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid storage configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// A stored response and the URL it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAudio {
    pub object_key: String,
    pub url: Url,
}

impl PublishedAudio {
    /// URL with `&` escaped for use inside an SSML `src` attribute.
    pub fn ssml_url(&self) -> String {
        escape_for_ssml(self.url.as_str())
    }
}

/// Escapes literal ampersands so a URL can sit inside speech markup.
pub fn escape_for_ssml(url: &str) -> String {
    url.replace('&', "&amp;")
}

#[async_trait]
pub trait AudioPublisher: Send + Sync {
    /// Stores `mp3` under a fresh key scoped to `device_id` and returns a
    /// presigned retrieval URL.
    async fn publish(&self, mp3: Bytes, device_id: Option<&str>) -> PublishResult<PublishedAudio>;
}
