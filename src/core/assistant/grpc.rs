//! Google Assistant gRPC transport
//!
//! Opens one `Converse` bidirectional stream per turn over a fresh TLS
//! channel, authenticated with the user's OAuth access token. Outbound
//! [`DialogRequest`]s are mapped to wire messages as they are polled;
//! inbound wire messages are mapped to [`SessionEvent`]s by a spawned task.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tonic::codec::ProstCodec;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status, Streaming};
use tracing::{debug, info, warn};

use super::base::{
    AssistantError, AssistantResult, ConversationState, DialogBackend, DialogChannels,
    DialogRequest, DialogResult, MicrophoneMode, SessionEvent,
};
use super::messages::{
    AudioInConfig, AudioInEncoding, AudioOutConfig, AudioOutEncoding, CONVERSE_PATH,
    ConverseConfig, ConverseRequest, ConverseResponse, ConverseResult, ConverseState, EventType,
    WireMicrophoneMode, converse_response,
};

/// Outbound messages buffered before the sender waits.
const REQUEST_BUFFER: usize = 64;

/// Inbound events buffered before the reader waits.
const EVENT_BUFFER: usize = 256;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts `host`, `host:port` or a full URL; bare hosts get `https://`.
pub fn normalize_endpoint(api_endpoint: &str) -> AssistantResult<String> {
    let trimmed = api_endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AssistantError::ConfigurationError(
            "API endpoint is empty".into(),
        ));
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

fn bearer_value(access_token: &str) -> AssistantResult<AsciiMetadataValue> {
    format!("Bearer {access_token}").parse().map_err(|_| {
        AssistantError::AuthenticationFailed("access token is not valid header text".into())
    })
}

/// Maps an outbound request to its wire form.
pub fn to_wire(request: DialogRequest) -> ConverseRequest {
    match request {
        DialogRequest::Config {
            audio_in,
            audio_out,
            prior_state,
        } => ConverseRequest::config(ConverseConfig {
            audio_in_config: Some(AudioInConfig {
                encoding: AudioInEncoding::Linear16 as i32,
                sample_rate_hertz: audio_in.format.sample_rate as i32,
            }),
            audio_out_config: Some(AudioOutConfig {
                encoding: AudioOutEncoding::Linear16 as i32,
                sample_rate_hertz: audio_out.format.sample_rate as i32,
                volume_percentage: audio_out.volume_percentage,
            }),
            converse_state: prior_state.map(|state| ConverseState {
                conversation_state: state.as_bytes().clone(),
            }),
        }),
        DialogRequest::Audio(data) => ConverseRequest::audio(data),
    }
}

fn result_from_wire(result: ConverseResult) -> DialogResult {
    let microphone_mode = match WireMicrophoneMode::try_from(result.microphone_mode) {
        Ok(WireMicrophoneMode::DialogFollowOn) => Some(MicrophoneMode::Open),
        Ok(WireMicrophoneMode::CloseMicrophone) => Some(MicrophoneMode::Closed),
        _ => None,
    };

    if result.volume_percentage != 0 {
        debug!(volume = result.volume_percentage, "Assistant requested volume change");
    }

    DialogResult {
        request_text: Some(result.spoken_request_text).filter(|t| !t.is_empty()),
        response_text: Some(result.spoken_response_text).filter(|t| !t.is_empty()),
        microphone_mode,
        conversation_state: Some(result.conversation_state)
            .filter(|s| !s.is_empty())
            .map(ConversationState::new),
    }
}

/// Maps an inbound wire message to a session event. Messages carrying
/// nothing the bridge cares about map to `None`.
pub fn from_wire(response: ConverseResponse) -> Option<SessionEvent> {
    match response.payload? {
        converse_response::Payload::EventType(event) => {
            match EventType::try_from(event) {
                Ok(EventType::EndOfUtterance) => Some(SessionEvent::UtteranceEnded),
                _ => None,
            }
        }
        converse_response::Payload::AudioOut(audio) => {
            Some(SessionEvent::AudioOut(audio.audio_data))
        }
        converse_response::Payload::Result(result) => {
            Some(SessionEvent::Result(result_from_wire(result)))
        }
        converse_response::Payload::Error(status) => Some(SessionEvent::Error(format!(
            "code {}: {}",
            status.code, status.message
        ))),
    }
}

/// `Converse` client over tonic.
#[derive(Debug, Clone)]
pub struct GoogleAssistantBackend {
    endpoint: Option<String>,
    connect_timeout: Duration,
}

impl GoogleAssistantBackend {
    /// `None` builds a backend that refuses to connect; the server can start
    /// before the endpoint is configured.
    pub fn new(api_endpoint: Option<&str>) -> AssistantResult<Self> {
        Ok(Self {
            endpoint: api_endpoint.map(normalize_endpoint).transpose()?,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    async fn connect(&self) -> AssistantResult<Channel> {
        let Some(url) = self.endpoint.as_deref() else {
            return Err(AssistantError::ConfigurationError(
                "API endpoint is not set".into(),
            ));
        };
        let mut endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| AssistantError::ConfigurationError(format!("Invalid API endpoint: {e}")))?
            .connect_timeout(self.connect_timeout);

        if url.starts_with("https://") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new()).map_err(|e| {
                AssistantError::ConfigurationError(format!("TLS config error: {e}"))
            })?;
        }

        let channel = endpoint.connect().await.map_err(|e| {
            AssistantError::ConnectionFailed(format!("gRPC connection failed: {e}"))
        })?;

        debug!(endpoint = %url, "Connected to assistant endpoint");
        Ok(channel)
    }
}

#[async_trait]
impl DialogBackend for GoogleAssistantBackend {
    async fn open(&self, access_token: &str) -> AssistantResult<DialogChannels> {
        let authorization = bearer_value(access_token)?;
        let channel = self.connect().await?;

        let (request_tx, request_rx) = mpsc::channel::<DialogRequest>(REQUEST_BUFFER);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(EVENT_BUFFER);

        let mut request = Request::new(ConverseRequestStream { rx: request_rx });
        request.metadata_mut().insert("authorization", authorization);

        tokio::spawn(async move {
            match converse(channel, request).await {
                Ok(stream) => pump_responses(stream, event_tx).await,
                Err(status) => {
                    warn!(code = ?status.code(), message = status.message(), "Converse call failed");
                    let _ = event_tx
                        .send(SessionEvent::Error(format!(
                            "{:?}: {}",
                            status.code(),
                            status.message()
                        )))
                        .await;
                }
            }
        });

        info!(endpoint = self.endpoint().unwrap_or("-"), "Opened Converse stream");
        Ok(DialogChannels {
            requests: request_tx,
            events: event_rx,
        })
    }
}

async fn converse<S>(
    channel: Channel,
    request: Request<S>,
) -> Result<Streaming<ConverseResponse>, Status>
where
    S: Stream<Item = ConverseRequest> + Send + 'static,
{
    use tonic::codegen::http::uri::PathAndQuery;

    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("Service not ready: {e}")))?;

    let codec: ProstCodec<ConverseRequest, ConverseResponse> = ProstCodec::default();
    let path = PathAndQuery::from_static(CONVERSE_PATH);

    let response = grpc.streaming(request, path, codec).await?;
    Ok(response.into_inner())
}

async fn pump_responses(
    mut stream: Streaming<ConverseResponse>,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    loop {
        match stream.message().await {
            Ok(Some(response)) => {
                if let Some(event) = from_wire(response) {
                    if event_tx.send(event).await.is_err() {
                        debug!("Session dropped, stopping response reader");
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(status) => {
                let _ = event_tx
                    .send(SessionEvent::Error(format!(
                        "{:?}: {}",
                        status.code(),
                        status.message()
                    )))
                    .await;
                break;
            }
        }
    }
    debug!("Converse response stream ended");
}

/// Adapts the outbound request channel to the stream tonic polls.
struct ConverseRequestStream {
    rx: mpsc::Receiver<DialogRequest>,
}

impl Stream for ConverseRequestStream {
    type Item = ConverseRequest;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|item| item.map(to_wire))
    }
}
