use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use super::{next_timestamp, turn_from, InterviewStore};
use crate::error::{Error, Result};
use crate::model::{
    Interview, NewTurn, ParticipantId, Report, Scope, Session, SessionUpdate, Status, Turn,
};
use crate::progress;

#[derive(Default)]
struct Documents {
    interviews: HashMap<String, Interview>,
    sessions: HashMap<String, BTreeMap<ParticipantId, Session>>,
    transcripts: HashMap<Scope, Vec<Turn>>,
}

/// Process-local store, used for development and tests
///
/// A single lock guards every document, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Documents>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_interview(id: &str) -> Error {
    Error::NotFound(format!("interview {}", id))
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_interview(&self, interview: &Interview) -> Result<()> {
        let mut docs = self.documents.write().await;
        if docs.interviews.contains_key(&interview.id) {
            return Err(Error::InvalidInput(format!(
                "interview {} already exists",
                interview.id
            )));
        }
        docs.interviews
            .insert(interview.id.clone(), interview.clone());
        Ok(())
    }

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>> {
        let docs = self.documents.read().await;
        Ok(docs.interviews.get(id).cloned())
    }

    async fn list_interviews(&self) -> Result<Vec<Interview>> {
        let docs = self.documents.read().await;
        let mut interviews: Vec<Interview> = docs.interviews.values().cloned().collect();
        interviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(interviews)
    }

    async fn update_interview_progress(
        &self,
        id: &str,
        progress: u8,
        status: Status,
    ) -> Result<Interview> {
        let mut docs = self.documents.write().await;
        let interview = docs
            .interviews
            .get_mut(id)
            .ok_or_else(|| missing_interview(id))?;
        interview.apply_progress(progress, status);
        Ok(interview.clone())
    }

    async fn upsert_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
        update: &SessionUpdate,
    ) -> Result<Session> {
        let mut docs = self.documents.write().await;
        if !docs.interviews.contains_key(interview_id) {
            return Err(missing_interview(interview_id));
        }

        let session = docs
            .sessions
            .entry(interview_id.to_string())
            .or_default()
            .entry(participant.clone())
            .or_insert_with(|| Session::new(participant.clone()));
        session.apply(update, Utc::now());

        debug!(
            interview_id,
            participant = %participant,
            progress = session.progress,
            "Session updated"
        );

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<Session>> {
        let docs = self.documents.read().await;
        Ok(docs
            .sessions
            .get(interview_id)
            .and_then(|sessions| sessions.get(participant))
            .cloned())
    }

    async fn list_sessions(&self, interview_id: &str) -> Result<Vec<Session>> {
        let docs = self.documents.read().await;
        Ok(docs
            .sessions
            .get(interview_id)
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn recompute_aggregate(&self, interview_id: &str) -> Result<Interview> {
        let mut docs = self.documents.write().await;
        let sessions: Vec<Session> = docs
            .sessions
            .get(interview_id)
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default();

        let interview = docs
            .interviews
            .get_mut(interview_id)
            .ok_or_else(|| missing_interview(interview_id))?;
        progress::apply_aggregate(interview, &sessions);

        Ok(interview.clone())
    }

    async fn append_turn(&self, scope: &Scope, turn: NewTurn) -> Result<Turn> {
        let mut docs = self.documents.write().await;
        if !docs.interviews.contains_key(scope.interview_id()) {
            return Err(missing_interview(scope.interview_id()));
        }

        let transcript = docs.transcripts.entry(scope.clone()).or_default();
        let timestamp = next_timestamp(transcript.last().map(|t| t.timestamp));
        let turn = turn_from(turn, timestamp);
        transcript.push(turn.clone());

        Ok(turn)
    }

    async fn turns(&self, scope: &Scope) -> Result<Vec<Turn>> {
        let docs = self.documents.read().await;
        Ok(docs.transcripts.get(scope).cloned().unwrap_or_default())
    }

    async fn save_report(&self, scope: &Scope, report: &Report) -> Result<()> {
        let mut docs = self.documents.write().await;
        let now = Utc::now();

        match scope {
            Scope::Interview(id) => {
                let interview = docs
                    .interviews
                    .get_mut(id)
                    .ok_or_else(|| missing_interview(id))?;
                interview.report = Some(report.clone());
                interview.report_generated_at = Some(now);
            }
            Scope::Participant {
                interview_id,
                participant,
            } => {
                let session = docs
                    .sessions
                    .get_mut(interview_id)
                    .and_then(|sessions| sessions.get_mut(participant))
                    .ok_or_else(|| Error::NotFound(format!("session {}", scope)))?;
                session.report = Some(report.clone());
                session.report_generated_at = Some(now);
            }
        }

        Ok(())
    }
}
