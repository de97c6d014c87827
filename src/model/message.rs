use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Participant,
    Agent,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Participant => "participant",
            Speaker::Agent => "agent",
        }
    }
}

/// One persisted utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,

    /// Assigned by the store, strictly increasing within a transcript
    pub timestamp: DateTime<Utc>,

    /// Priming message sent on the participant's behalf, hidden from transcripts
    #[serde(default)]
    pub synthetic: bool,
}

/// A turn before the store assigns its timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub speaker: Speaker,
    pub text: String,
    pub synthetic: bool,
}

impl NewTurn {
    pub fn participant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Participant,
            text: text.into(),
            synthetic: false,
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            synthetic: false,
        }
    }

    pub fn priming(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Participant,
            text: text.into(),
            synthetic: true,
        }
    }
}
