//! Turn-level error taxonomy.
//!
//! Every failure inside a turn ends up here and is rendered to the user as a
//! spoken response. Nothing is retried and nothing escapes to the host.

use thiserror::Error;

use crate::core::assistant::AssistantError;
use crate::core::audio::TranscodeError;
use crate::core::publisher::PublishError;
use crate::core::tts::TTSError;

/// Prompt used whenever the skill session carries no linked account.
pub const LINK_ACCOUNT_PROMPT: &str = "You must link your Google account to use this skill. \
     Please use the link in the Alexa app to authorise your Google Account.";

/// Errors that terminate a single conversation turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// A required configuration value is missing
    #[error("{0} is not set")]
    Configuration(&'static str),

    /// The skill session has no linked account / access token
    #[error("No linked account access token")]
    Authentication,

    /// Transport-level failure on the dialog stream
    #[error("Dialog backend stream error: {0}")]
    BackendStream(String),

    /// The guard timer fired before the backend finished
    #[error("Dialog backend did not respond within {0:?}")]
    BackendTimeout(std::time::Duration),

    /// Text-to-speech failed
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] TTSError),

    /// MP3 encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(#[from] TranscodeError),

    /// Upload to object storage failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Presigning the retrieval URL failed
    #[error("URL signing failed: {0}")]
    Signing(String),
}

/// Result type for turn operations.
pub type TurnResult<T> = Result<T, TurnError>;

impl TurnError {
    /// Text spoken back to the user for this failure.
    pub fn spoken_message(&self) -> String {
        match self {
            Self::Configuration(name) => format!("ERROR! {name} is not set"),
            Self::Authentication => LINK_ACCOUNT_PROMPT.to_string(),
            Self::BackendStream(_) | Self::BackendTimeout(_) => {
                "Sorry, the Google Assistant did not respond in time. Please try again.".to_string()
            }
            Self::Synthesis(_) => {
                "Sorry, I could not convert your request to speech. \
                 Please check the Amazon Polly configuration."
                    .to_string()
            }
            Self::Encoding(_) => {
                "Sorry, there was a problem preparing the Google Assistant response.".to_string()
            }
            Self::Upload(_) | Self::Signing(_) => {
                "Sorry, I could not store the response audio. \
                 Please check that the S3 bucket exists and that this skill has permission to write to it."
                    .to_string()
            }
        }
    }

    /// Whether the response should carry an account-linking card.
    pub fn needs_account_link(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

impl From<PublishError> for TurnError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Signing(msg) => Self::Signing(msg),
            other => Self::Upload(other.to_string()),
        }
    }
}

impl From<AssistantError> for TurnError {
    fn from(err: AssistantError) -> Self {
        Self::BackendStream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_configuration_message_names_value() {
        let err = TurnError::Configuration("Client ID");
        assert_eq!(err.spoken_message(), "ERROR! Client ID is not set");
        assert!(!err.needs_account_link());
    }

    #[test]
    fn test_authentication_requests_linking() {
        let err = TurnError::Authentication;
        assert!(err.needs_account_link());
        assert!(err.spoken_message().contains("link your Google account"));
    }

    #[test]
    fn test_storage_errors_mention_bucket() {
        let upload: TurnError = PublishError::Upload("denied".into()).into();
        let signing: TurnError = PublishError::Signing("no creds".into()).into();
        assert!(matches!(upload, TurnError::Upload(_)));
        assert!(matches!(signing, TurnError::Signing(_)));
        assert!(upload.spoken_message().contains("S3 bucket"));
        assert!(signing.spoken_message().contains("permission"));
    }

    #[test]
    fn test_encoding_message_is_generic() {
        let err: TurnError = TranscodeError::Encode("buffer too small".into()).into();
        assert!(matches!(err, TurnError::Encoding(_)));
        let spoken = err.spoken_message();
        assert!(spoken.starts_with("Sorry"));
        assert!(!spoken.contains("buffer too small"));
        assert!(!err.needs_account_link());
    }

    #[test]
    fn test_timeout_message() {
        let err = TurnError::BackendTimeout(Duration::from_secs(10));
        assert!(err.spoken_message().contains("did not respond"));
        assert!(err.to_string().contains("10s"));
    }
}
