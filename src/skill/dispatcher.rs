//! Intent routing for the voice skill.
//!
//! Each request is checked, mapped to an utterance where needed, run
//! through the [`TurnOrchestrator`] and rendered back as a `tell` or `ask`
//! response. Conversation context lives in the [`SessionStore`] between
//! turns of one skill session.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::request::{Intent, RequestEnvelope, SkillRequest};
use super::response::{BLANK_SSML, Card, OutputSpeech, ResponseEnvelope, audio_ssml};
use crate::config::BridgeConfig;
use crate::core::turn::{
    ConversationContext, SessionStore, TurnOrchestrator, TurnOutcome, TurnRequest,
};
use crate::errors::{TurnError, TurnResult};

pub const SEARCH_INTENT: &str = "SearchIntent";
pub const SEARCH_SLOT: &str = "search";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";

const STOP_UTTERANCE: &str = "STOP";
const CANCEL_UTTERANCE: &str = "CANCEL";

const LAUNCH_PROMPT: &str = "How may I help?";
const HELP_PROMPT: &str = "Ask me anything you would ask the Google Assistant. What would you like to know?";
const REPEAT_PROMPT: &str = "Sorry, I didn't catch that. What would you like to ask?";
const UNHANDLED_MESSAGE: &str = "Sorry, I can't help with that.";
const GOODBYE_MESSAGE: &str = "Goodbye.";

pub const CARD_TITLE: &str = "Google Assistant";
pub const DEBUG_CARD_TITLE: &str = "Debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkillError {
    #[error("Request application id {received:?} does not match the configured skill")]
    ApplicationMismatch { received: Option<String> },
}

/// Maps a spoken control word to the synthetic utterance that closes the
/// backend conversation.
pub fn control_utterance(text: &str) -> Option<&'static str> {
    match text.trim().to_ascii_lowercase().as_str() {
        "stop" | "exit" => Some(STOP_UTTERANCE),
        "cancel" => Some(CANCEL_UTTERANCE),
        _ => None,
    }
}

pub struct SkillDispatcher {
    config: Arc<BridgeConfig>,
    orchestrator: Arc<TurnOrchestrator>,
    sessions: Arc<SessionStore>,
}

impl SkillDispatcher {
    pub fn new(
        config: Arc<BridgeConfig>,
        orchestrator: Arc<TurnOrchestrator>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Rejects requests addressed to another skill when an app id is
    /// configured.
    pub fn verify_application(&self, envelope: &RequestEnvelope) -> Result<(), SkillError> {
        let Some(expected) = self.config.alexa_app_id.as_deref() else {
            return Ok(());
        };
        match envelope.application_id() {
            Some(received) if received == expected => Ok(()),
            received => Err(SkillError::ApplicationMismatch {
                received: received.map(String::from),
            }),
        }
    }

    pub async fn handle(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        info!(
            request_type = envelope.request_type(),
            session_id = envelope.session_id().unwrap_or("-"),
            "Handling skill request"
        );

        match &envelope.request {
            SkillRequest::LaunchRequest(_) => self.on_launch(envelope),
            SkillRequest::IntentRequest(request) => {
                let intent = &request.intent;
                debug!(intent = %intent.name, "Intent request");
                match intent.name.as_str() {
                    SEARCH_INTENT => self.on_search(envelope, intent).await,
                    HELP_INTENT => ResponseEnvelope::ask_text(HELP_PROMPT),
                    STOP_INTENT => self.on_stop(envelope, STOP_UTTERANCE).await,
                    CANCEL_INTENT => self.on_stop(envelope, CANCEL_UTTERANCE).await,
                    _ => self.on_unhandled(envelope).await,
                }
            }
            SkillRequest::SessionEndedRequest(request) => {
                info!(
                    reason = request.reason.as_deref().unwrap_or("unknown"),
                    "Skill session ended"
                );
                self.on_session_ended(envelope).await
            }
            SkillRequest::Unknown => self.on_unhandled(envelope).await,
        }
    }

    fn on_launch(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        if let Err(e) = self.preflight(envelope) {
            return error_response(&e);
        }
        ResponseEnvelope::ask_text(LAUNCH_PROMPT)
    }

    async fn on_search(&self, envelope: &RequestEnvelope, intent: &Intent) -> ResponseEnvelope {
        let access_token = match self.preflight(envelope) {
            Ok(token) => token,
            Err(e) => return error_response(&e),
        };

        let spoken = self
            .config
            .utterance_override
            .as_deref()
            .or_else(|| intent.slot_value(SEARCH_SLOT));
        let Some(spoken) = spoken else {
            return ResponseEnvelope::ask_text(REPEAT_PROMPT);
        };

        let control = control_utterance(spoken);
        let utterance = control.unwrap_or(spoken).to_string();
        let session_id = envelope.session_id();
        let context = session_id
            .map(|id| self.sessions.get(id))
            .unwrap_or_default();

        match self.converse(envelope, access_token, utterance, context).await {
            Ok(outcome) => {
                let response = self.render(&outcome, control.is_some());
                // the skill runtime sends no SessionEndedRequest for sessions
                // the skill ends itself
                if let Some(id) = session_id {
                    if response.ends_session() {
                        self.sessions.remove(id);
                    } else {
                        self.sessions.put(id, outcome.context);
                    }
                }
                response
            }
            Err(e) => error_response(&e),
        }
    }

    /// Stop/Cancel: close an open backend conversation, then end the
    /// session either way.
    async fn on_stop(&self, envelope: &RequestEnvelope, word: &'static str) -> ResponseEnvelope {
        match self.close_conversation(envelope, word).await {
            Some(Ok(outcome)) => self.render(&outcome, true),
            Some(Err(e)) => {
                warn!(error = %e, "Failed to close Google Assistant conversation");
                ResponseEnvelope::tell_text(GOODBYE_MESSAGE)
            }
            None => ResponseEnvelope::tell_text(GOODBYE_MESSAGE),
        }
    }

    async fn on_session_ended(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        if let Some(Err(e)) = self.close_conversation(envelope, STOP_UTTERANCE).await {
            warn!(error = %e, "Failed to close Google Assistant conversation");
        }
        ResponseEnvelope::empty()
    }

    async fn on_unhandled(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        match self.close_conversation(envelope, STOP_UTTERANCE).await {
            Some(Ok(outcome)) => self.render(&outcome, true),
            Some(Err(e)) => error_response(&e),
            None => ResponseEnvelope::tell_text(UNHANDLED_MESSAGE),
        }
    }

    /// Runs a `word` turn if this session's microphone is open. Always
    /// discards the session's context. `None` when nothing needed closing.
    async fn close_conversation(
        &self,
        envelope: &RequestEnvelope,
        word: &'static str,
    ) -> Option<TurnResult<TurnOutcome>> {
        let session_id = envelope.session_id()?;
        let context = self.sessions.remove(session_id)?;
        if !context.is_microphone_open() {
            return None;
        }

        info!(session_id = %session_id, utterance = word, "Closing open conversation");
        let access_token = match self.preflight(envelope) {
            Ok(token) => token,
            Err(e) => return Some(Err(e)),
        };
        Some(
            self.converse(envelope, access_token, word.to_string(), context)
                .await,
        )
    }

    /// Configuration and account-link checks shared by every turn. Returns
    /// the access token.
    fn preflight<'a>(&self, envelope: &'a RequestEnvelope) -> TurnResult<&'a str> {
        self.config.check_turn_requirements()?;
        envelope.access_token().ok_or(TurnError::Authentication)
    }

    async fn converse(
        &self,
        envelope: &RequestEnvelope,
        access_token: &str,
        utterance: String,
        context: ConversationContext,
    ) -> TurnResult<TurnOutcome> {
        let device_id = self
            .config
            .device_id
            .as_deref()
            .or_else(|| envelope.device_id())
            .map(String::from);

        self.orchestrator
            .run_turn(TurnRequest {
                utterance,
                access_token: access_token.to_string(),
                context,
                device_id,
            })
            .await
    }

    fn render(&self, outcome: &TurnOutcome, end_session: bool) -> ResponseEnvelope {
        let speech = match &outcome.audio {
            Some(audio) => OutputSpeech::ssml(audio_ssml(&audio.ssml_url())),
            None => {
                debug!("No audio from Google Assistant, sending blank response");
                OutputSpeech::ssml(BLANK_SSML)
            }
        };

        let response = if outcome.context.is_microphone_open() && !end_session {
            ResponseEnvelope::ask(speech, OutputSpeech::ssml(BLANK_SSML))
        } else {
            ResponseEnvelope::tell(speech)
        };

        match self.card_for(outcome) {
            Some(card) => response.with_card(card),
            None => response,
        }
    }

    fn card_for(&self, outcome: &TurnOutcome) -> Option<Card> {
        let mut lines = Vec::new();
        if let Some(request) = &outcome.request_text {
            lines.push(format!("Request: {request}"));
        }
        if let Some(response) = &outcome.response_text {
            lines.push(format!("Response: {response}"));
        }

        if self.config.debug_mode {
            lines.push(outcome.timings.card_text());
            return Some(Card::Simple {
                title: DEBUG_CARD_TITLE.to_string(),
                content: lines.join("\n"),
            });
        }

        if lines.is_empty() {
            return None;
        }
        Some(Card::Simple {
            title: CARD_TITLE.to_string(),
            content: lines.join("\n"),
        })
    }
}

fn error_response(err: &TurnError) -> ResponseEnvelope {
    if err.needs_account_link() {
        ResponseEnvelope::link_account(err.spoken_message())
    } else {
        ResponseEnvelope::tell_text(err.spoken_message())
    }
}
