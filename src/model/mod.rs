//! Persisted data model
//!
//! - `Interview`: one diagnostic engagement (solo or multi-participant)
//! - `Session`: one participant's progress within a multi-participant interview
//! - `Turn`: one utterance in a transcript
//! - `Report`: the scored maturity assessment compiled from transcripts

mod interview;
mod message;
mod report;
mod session;

pub use interview::{Interview, InterviewKind, PlannedParticipant, Status};
pub use message::{NewTurn, Speaker, Turn};
pub use report::{
    Dimension, DimensionAssessment, Dimensions, Horizon, ImpactTier, Initiative, Report, Roadmap,
};
pub use session::{Session, SessionUpdate};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant contact identifier (an e-mail address in practice)
///
/// Always stored trimmed and lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a transcript and its report live
///
/// Solo interviews keep messages and report on the interview itself; each
/// participant of a multi-participant interview has a session of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Interview(String),
    Participant {
        interview_id: String,
        participant: ParticipantId,
    },
}

impl Scope {
    pub fn interview_id(&self) -> &str {
        match self {
            Scope::Interview(id) => id,
            Scope::Participant { interview_id, .. } => interview_id,
        }
    }

    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Scope::Interview(_) => None,
            Scope::Participant { participant, .. } => Some(participant),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Interview(id) => write!(f, "interviews/{}", id),
            Scope::Participant {
                interview_id,
                participant,
            } => write!(f, "interviews/{}/sessions/{}", interview_id, participant),
        }
    }
}
