//! Outbound skill response envelope and builders.

use serde::Serialize;

/// SSML body used when there is nothing to play.
pub const BLANK_SSML: &str = "<speak> </speak>";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    pub response: SkillResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_end_session: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutputSpeech {
    PlainText { text: String },
    #[serde(rename = "SSML")]
    Ssml { ssml: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Card {
    Simple { title: String, content: String },
    LinkAccount,
}

/// `<speak><audio src="..."/></speak>` for an already-escaped URL.
pub fn audio_ssml(escaped_url: &str) -> String {
    format!("<speak><audio src=\"{escaped_url}\"/></speak>")
}

impl OutputSpeech {
    pub fn text(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn ssml(ssml: impl Into<String>) -> Self {
        Self::Ssml { ssml: ssml.into() }
    }
}

impl ResponseEnvelope {
    fn new(response: SkillResponse) -> Self {
        Self {
            version: "1.0".to_string(),
            response,
        }
    }

    /// Speak and end the session.
    pub fn tell(speech: OutputSpeech) -> Self {
        Self::new(SkillResponse {
            output_speech: Some(speech),
            should_end_session: Some(true),
            ..Default::default()
        })
    }

    /// Speak and keep listening.
    pub fn ask(speech: OutputSpeech, reprompt: OutputSpeech) -> Self {
        Self::new(SkillResponse {
            output_speech: Some(speech),
            reprompt: Some(Reprompt {
                output_speech: reprompt,
            }),
            should_end_session: Some(false),
            ..Default::default()
        })
    }

    pub fn tell_text(text: impl Into<String>) -> Self {
        Self::tell(OutputSpeech::text(text))
    }

    pub fn ask_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::ask(OutputSpeech::text(text.clone()), OutputSpeech::text(text))
    }

    /// `tell` with a LinkAccount card.
    pub fn link_account(text: impl Into<String>) -> Self {
        Self::tell_text(text).with_card(Card::LinkAccount)
    }

    /// No speech at all; used for session-ended notifications.
    pub fn empty() -> Self {
        Self::new(SkillResponse::default())
    }

    pub fn with_card(mut self, card: Card) -> Self {
        self.response.card = Some(card);
        self
    }

    pub fn ends_session(&self) -> bool {
        self.response.should_end_session.unwrap_or(true)
    }
}
