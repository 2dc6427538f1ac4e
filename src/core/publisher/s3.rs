use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::base::{AudioPublisher, PublishError, PublishResult, PublishedAudio};

pub const MP3_CONTENT_TYPE: &str = "audio/mpeg";

/// Presigned URLs only need to outlive immediate playback.
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct S3PublisherConfig {
    pub bucket: String,
    pub region: String,
    pub prefix: Option<String>,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub url_expiry: Duration,
}

impl Default for S3PublisherConfig {
    fn default() -> Self {
        Self {
            bucket: "alexa-assistant-bridge".to_string(),
            region: "us-east-1".to_string(),
            prefix: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }
}

fn is_valid_key_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains("..") && !segment.contains('/')
}

/// Build the object key for one response.
///
/// Path format:
/// - With device id: `{prefix}/{device_id}/{id}.mp3`
/// - Without: `{prefix}/{id}.mp3`
///
/// An unusable device id (empty, or containing `/` or `..`) is left out.
pub fn build_object_key(prefix: Option<&str>, device_id: Option<&str>, id: &str) -> String {
    let normalized_prefix = prefix
        .map(|p| p.trim().trim_matches('/'))
        .filter(|p| !p.is_empty());
    let device_id = device_id.map(str::trim).filter(|d| is_valid_key_segment(d));

    match (normalized_prefix, device_id) {
        (None, None) => format!("{id}.mp3"),
        (None, Some(device)) => format!("{device}/{id}.mp3"),
        (Some(prefix), None) => format!("{prefix}/{id}.mp3"),
        (Some(prefix), Some(device)) => format!("{prefix}/{device}/{id}.mp3"),
    }
}

/// Publishes MP3 responses to any [`ObjectStore`] that has a matching
/// [`Signer`]. In production both are the same S3 client.
#[derive(Clone)]
pub struct ObjectStorePublisher {
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
    prefix: Option<String>,
    url_expiry: Duration,
}

impl ObjectStorePublisher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        signer: Arc<dyn Signer>,
        prefix: Option<String>,
        url_expiry: Duration,
    ) -> Self {
        Self {
            store,
            signer,
            prefix,
            url_expiry,
        }
    }

    /// Builds an S3-backed publisher. Credentials not given explicitly are
    /// picked up from the `AWS_*` environment.
    pub fn from_s3_config(config: &S3PublisherConfig) -> PublishResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(PublishError::InvalidConfiguration(
                "bucket name is empty".to_string(),
            ));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(config.bucket.trim())
            .with_region(&config.region);

        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key)
                .with_secret_access_key(secret);
        }
        if let Some(token) = &config.session_token {
            builder = builder.with_token(token);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let s3 = Arc::new(
            builder
                .build()
                .map_err(|e| PublishError::InvalidConfiguration(e.to_string()))?,
        );

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 publisher configured"
        );

        Ok(Self::new(
            s3.clone(),
            s3,
            config.prefix.clone(),
            config.url_expiry,
        ))
    }

    pub fn url_expiry(&self) -> Duration {
        self.url_expiry
    }

    /// Writes `mp3` to `object_key` and presigns a GET for it.
    pub async fn upload(&self, mp3: Bytes, object_key: &str) -> PublishResult<PublishedAudio> {
        let path = ObjectPath::from(object_key);
        let size = mp3.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, MP3_CONTENT_TYPE.into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&path, PutPayload::from(mp3), options)
            .await
            .map_err(|e| {
                warn!(object_key = %object_key, error = %e, "Failed to upload response audio");
                PublishError::Upload(e.to_string())
            })?;

        debug!(object_key = %object_key, size_bytes = size, "Uploaded response audio");

        let url = self
            .signer
            .signed_url(Method::GET, &path, self.url_expiry)
            .await
            .map_err(|e| {
                warn!(object_key = %object_key, error = %e, "Failed to presign response URL");
                PublishError::Signing(e.to_string())
            })?;

        Ok(PublishedAudio {
            object_key: object_key.to_string(),
            url,
        })
    }
}

#[async_trait]
impl AudioPublisher for ObjectStorePublisher {
    async fn publish(&self, mp3: Bytes, device_id: Option<&str>) -> PublishResult<PublishedAudio> {
        let id = Uuid::new_v4().to_string();
        let key = build_object_key(self.prefix.as_deref(), device_id, &id);
        self.upload(mp3, &key).await
    }
}
