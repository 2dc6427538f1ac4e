//! Conversation Session
//!
//! One dialog stream for one turn: a config message, then audio chunks while
//! the `sending` flag is set. The flag clears the moment the backend reports
//! end of utterance, and the outbound half is closed right there. Chunks
//! offered after that are ignored rather than treated as errors.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::base::{
    AssistantError, AssistantResult, AudioInSpec, AudioOutSpec, ConversationState, DialogBackend,
    DialogChannels, DialogRequest, SessionEvent,
};

pub struct ConversationSession {
    requests: Option<mpsc::Sender<DialogRequest>>,
    events: mpsc::Receiver<SessionEvent>,
    prior_state: ConversationState,
    sending: bool,
    ended: bool,
    chunks_sent: usize,
    chunks_ignored: usize,
}

impl ConversationSession {
    /// Opens a stream on `backend`, remembering `prior_state` for the config
    /// message.
    pub async fn open(
        backend: &dyn DialogBackend,
        access_token: &str,
        prior_state: ConversationState,
    ) -> AssistantResult<Self> {
        let channels = backend.open(access_token).await?;
        Ok(Self::from_channels(channels, prior_state))
    }

    pub fn from_channels(channels: DialogChannels, prior_state: ConversationState) -> Self {
        Self {
            requests: Some(channels.requests),
            events: channels.events,
            prior_state,
            sending: true,
            ended: false,
            chunks_sent: 0,
            chunks_ignored: 0,
        }
    }

    /// Sends the config message. Prior state is attached only when
    /// non-empty.
    pub async fn send_config(
        &mut self,
        audio_in: AudioInSpec,
        audio_out: AudioOutSpec,
    ) -> AssistantResult<()> {
        let prior_state = if self.prior_state.is_empty() {
            None
        } else {
            debug!(
                state_len = self.prior_state.len(),
                "Attaching prior conversation state"
            );
            Some(self.prior_state.clone())
        };

        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| AssistantError::StreamError("session already closed".into()))?;

        requests
            .send(DialogRequest::Config {
                audio_in,
                audio_out,
                prior_state,
            })
            .await
            .map_err(|_| AssistantError::StreamError("stream closed before config".into()))
    }

    /// Writes one audio chunk. Returns `false` (and writes nothing) once
    /// sending has stopped.
    pub async fn send_audio_chunk(&mut self, data: Bytes) -> bool {
        if !self.sending {
            self.chunks_ignored += 1;
            return false;
        }
        if data.is_empty() {
            return false;
        }

        let Some(requests) = self.requests.as_ref() else {
            self.chunks_ignored += 1;
            return false;
        };

        if requests.send(DialogRequest::Audio(data)).await.is_err() {
            warn!("Dialog stream closed while sending audio");
            self.close();
            return false;
        }

        self.chunks_sent += 1;
        true
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Chunks offered after sending stopped.
    pub fn chunks_ignored(&self) -> usize {
        self.chunks_ignored
    }

    /// Stops sending and half-closes the outbound stream.
    pub fn close(&mut self) {
        self.sending = false;
        if self.requests.take().is_some() {
            debug!(chunks_sent = self.chunks_sent, "Closed outbound dialog stream");
        }
    }

    /// Next inbound event. Yields `Ended` once the backend is done, and
    /// keeps yielding it afterwards. Cancel safe.
    pub async fn next_event(&mut self) -> SessionEvent {
        if self.ended {
            return SessionEvent::Ended;
        }

        match self.events.recv().await {
            Some(SessionEvent::UtteranceEnded) => {
                info!(chunks_sent = self.chunks_sent, "End of utterance received");
                self.close();
                SessionEvent::UtteranceEnded
            }
            Some(SessionEvent::Ended) | None => {
                self.ended = true;
                self.close();
                SessionEvent::Ended
            }
            Some(event) => event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assistant::base::{DialogResult, MicrophoneMode};

    fn session_with(
        prior: ConversationState,
    ) -> (
        ConversationSession,
        mpsc::Receiver<DialogRequest>,
        mpsc::Sender<SessionEvent>,
    ) {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (evt_tx, evt_rx) = mpsc::channel(16);
        let session = ConversationSession::from_channels(
            DialogChannels {
                requests: req_tx,
                events: evt_rx,
            },
            prior,
        );
        (session, req_rx, evt_tx)
    }

    #[tokio::test]
    async fn test_config_omits_empty_state() {
        let (mut session, mut req_rx, _evt_tx) = session_with(ConversationState::default());
        session
            .send_config(AudioInSpec::default(), AudioOutSpec::default())
            .await
            .unwrap();

        match req_rx.recv().await.unwrap() {
            DialogRequest::Config { prior_state, .. } => assert!(prior_state.is_none()),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_config_attaches_existing_state() {
        let state = ConversationState::new(Bytes::from_static(b"prior"));
        let (mut session, mut req_rx, _evt_tx) = session_with(state.clone());
        session
            .send_config(AudioInSpec::default(), AudioOutSpec::default())
            .await
            .unwrap();

        match req_rx.recv().await.unwrap() {
            DialogRequest::Config { prior_state, .. } => assert_eq!(prior_state, Some(state)),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_chunks_after_utterance_end() {
        let (mut session, mut req_rx, evt_tx) = session_with(ConversationState::default());

        assert!(session.send_audio_chunk(Bytes::from_static(&[1, 2])).await);
        assert!(session.send_audio_chunk(Bytes::from_static(&[3, 4])).await);

        evt_tx.send(SessionEvent::UtteranceEnded).await.unwrap();
        assert_eq!(session.next_event().await, SessionEvent::UtteranceEnded);
        assert!(!session.is_sending());

        for _ in 0..5 {
            assert!(!session.send_audio_chunk(Bytes::from_static(&[5, 6])).await);
        }
        assert_eq!(session.chunks_sent(), 2);
        assert_eq!(session.chunks_ignored(), 5);

        // exactly the two accepted chunks went out, then the stream closed
        assert!(matches!(req_rx.recv().await, Some(DialogRequest::Audio(_))));
        assert!(matches!(req_rx.recv().await, Some(DialogRequest::Audio(_))));
        assert!(req_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_events_pass_through_until_ended() {
        let (mut session, _req_rx, evt_tx) = session_with(ConversationState::default());

        let result = DialogResult {
            microphone_mode: Some(MicrophoneMode::Open),
            ..Default::default()
        };
        evt_tx.send(SessionEvent::Result(result.clone())).await.unwrap();
        evt_tx
            .send(SessionEvent::AudioOut(Bytes::from_static(&[0, 1])))
            .await
            .unwrap();
        evt_tx.send(SessionEvent::Error("transient".into())).await.unwrap();
        drop(evt_tx);

        assert_eq!(session.next_event().await, SessionEvent::Result(result));
        assert_eq!(
            session.next_event().await,
            SessionEvent::AudioOut(Bytes::from_static(&[0, 1]))
        );
        assert_eq!(
            session.next_event().await,
            SessionEvent::Error("transient".into())
        );
        assert_eq!(session.next_event().await, SessionEvent::Ended);
        assert_eq!(session.next_event().await, SessionEvent::Ended);
        assert!(!session.is_sending());
    }

    #[tokio::test]
    async fn test_closed_backend_stops_sending() {
        let (mut session, req_rx, _evt_tx) = session_with(ConversationState::default());
        drop(req_rx);
        assert!(!session.send_audio_chunk(Bytes::from_static(&[1])).await);
        assert!(!session.is_sending());
        assert_eq!(session.chunks_sent(), 0);
    }
}
