//! Publishing of encoded responses.
//!
//! The MP3 for a turn is written to object storage and handed back as a
//! short-lived presigned URL that the skill response can point at.

mod base;
mod s3;

pub use base::{AudioPublisher, PublishError, PublishResult, PublishedAudio, escape_for_ssml};
pub use s3::{
    DEFAULT_URL_EXPIRY, MP3_CONTENT_TYPE, ObjectStorePublisher, S3PublisherConfig,
    build_object_key,
};
