use chrono::{DateTime, Utc};
use serde::Serialize;

use super::machine::InterviewState;
use crate::model::{InterviewKind, ParticipantId};

/// Point-in-time view of a live interview session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub interview_id: String,

    pub participant: ParticipantId,

    pub kind: InterviewKind,

    /// Current state of the turn cycle
    pub state: InterviewState,

    /// Messages persisted so far, priming message included
    pub turn_count: usize,

    pub max_turns: usize,

    pub progress: u8,

    /// When this session was opened in this process
    pub opened_at: DateTime<Utc>,
}
