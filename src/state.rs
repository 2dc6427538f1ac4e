use std::sync::Arc;

use tracing::info;

use crate::config::BridgeConfig;
use crate::core::assistant::{DialogBackend, GoogleAssistantBackend};
use crate::core::audio::Mp3Transcoder;
use crate::core::publisher::{AudioPublisher, ObjectStorePublisher};
use crate::core::tts::{AwsPollyTTS, SpeechSynthesizer};
use crate::core::turn::{SessionStore, TurnOrchestrator};
use crate::skill::SkillDispatcher;

/// Shared application state
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub sessions: Arc<SessionStore>,
    pub dispatcher: SkillDispatcher,
}

impl AppState {
    /// Builds the production pipeline: Amazon Polly, the Google Assistant
    /// gRPC backend and S3 publishing.
    pub async fn new(
        config: BridgeConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let synthesizer = AwsPollyTTS::new(config.polly_config())?;
        let backend = GoogleAssistantBackend::new(config.api_endpoint.as_deref())?;
        let publisher = ObjectStorePublisher::from_s3_config(&config.s3_config())?;

        info!(
            voice = %config.polly_voice,
            bucket = %config.s3_bucket,
            backend_endpoint = backend.endpoint().unwrap_or("<unset>"),
            "Pipeline configured"
        );

        Ok(Self::with_components(
            config,
            Arc::new(synthesizer),
            Arc::new(backend),
            Arc::new(publisher),
        ))
    }

    /// Builds state around caller-supplied components.
    pub fn with_components(
        config: BridgeConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        backend: Arc<dyn DialogBackend>,
        publisher: Arc<dyn AudioPublisher>,
    ) -> Arc<Self> {
        let settings = config.turn_settings();
        let orchestrator = Arc::new(TurnOrchestrator::new(
            synthesizer,
            backend,
            Arc::new(Mp3Transcoder::default()),
            publisher,
            settings,
        ));
        let config = Arc::new(config);
        let sessions = Arc::new(SessionStore::new());
        let dispatcher = SkillDispatcher::new(config.clone(), orchestrator, sessions.clone());

        Arc::new(Self {
            config,
            sessions,
            dispatcher,
        })
    }
}
