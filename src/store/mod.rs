//! Interview persistence
//!
//! Document layout, whatever the backend:
//! - `interviews/{id}`: the interview
//! - `interviews/{id}/sessions/{participant}`: one participant's session
//! - `interviews/{id}/sessions/{participant}/messages`: that participant's turns
//! - `interviews/{id}/messages`: turns of a solo interview
//!
//! All writes are merges of the fields being changed. Aggregate progress is
//! recomputed by the store from session documents in one atomic step, so two
//! participants finishing at the same moment cannot overwrite each other.

mod kv;
mod memory;

pub use kv::NatsKvStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::model::{
    Interview, NewTurn, ParticipantId, Report, Scope, Session, SessionUpdate, Status, Turn,
};

/// Persistence contract for interviews, sessions, transcripts and reports
#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Persist a newly created interview
    async fn create_interview(&self, interview: &Interview) -> Result<()>;

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>>;

    async fn list_interviews(&self) -> Result<Vec<Interview>>;

    /// Merge progress and status into a solo interview
    async fn update_interview_progress(
        &self,
        id: &str,
        progress: u8,
        status: Status,
    ) -> Result<Interview>;

    /// Create or merge into a participant's session
    async fn upsert_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
        update: &SessionUpdate,
    ) -> Result<Session>;

    async fn get_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<Session>>;

    async fn list_sessions(&self, interview_id: &str) -> Result<Vec<Session>>;

    /// Rebuild the participant cache and aggregate progress from sessions
    async fn recompute_aggregate(&self, interview_id: &str) -> Result<Interview>;

    /// Append a turn, assigning its timestamp
    async fn append_turn(&self, scope: &Scope, turn: NewTurn) -> Result<Turn>;

    /// All turns of a transcript, oldest first
    async fn turns(&self, scope: &Scope) -> Result<Vec<Turn>>;

    /// The last `limit` turns of a transcript, oldest first
    async fn recent_turns(&self, scope: &Scope, limit: usize) -> Result<Vec<Turn>> {
        let mut turns = self.turns(scope).await?;
        let skip = turns.len().saturating_sub(limit);
        Ok(turns.split_off(skip))
    }

    /// Replace the report attached to an interview or a session
    async fn save_report(&self, scope: &Scope, report: &Report) -> Result<()>;
}

/// Timestamp for the next turn of a transcript, strictly after `last`
pub(crate) fn next_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

pub(crate) fn turn_from(new: NewTurn, timestamp: DateTime<Utc>) -> Turn {
    Turn {
        speaker: new.speaker,
        text: new.text,
        timestamp,
        synthetic: new.synthetic,
    }
}
