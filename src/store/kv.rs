use anyhow::Context;
use async_nats::jetstream::{self, kv};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{next_timestamp, turn_from, InterviewStore};
use crate::error::{Error, Result};
use crate::identity::encode_token;
use crate::model::{
    Interview, NewTurn, ParticipantId, Report, Scope, Session, SessionUpdate, Status, Turn,
};
use crate::progress;

/// Attempts at a compare-and-swap write before giving up
const MAX_CAS_ATTEMPTS: usize = 8;

/// Store backed by a NATS JetStream key-value bucket
///
/// Every document is one key holding JSON. Writes read the current revision
/// and update against it, retrying when another writer got there first, so
/// concurrent merges never clobber each other. Transcripts are one document
/// per scope, appended to under the same revision check.
pub struct NatsKvStore {
    kv: kv::Store,
}

impl NatsKvStore {
    /// Connect to NATS and open (or create) the bucket
    pub async fn connect(url: &str, bucket: &str) -> anyhow::Result<Self> {
        info!("Connecting to NATS key-value store at {} (bucket {})", url, bucket);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;
        let jetstream = jetstream::new(client);

        let kv = match jetstream.get_key_value(bucket.to_string()).await {
            Ok(kv) => kv,
            Err(_) => {
                info!("Creating key-value bucket {}", bucket);
                jetstream
                    .create_key_value(kv::Config {
                        bucket: bucket.to_string(),
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .context("Failed to create key-value bucket")?
            }
        };

        Ok(Self { kv })
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = self.kv.get(key.to_string()).await.map_err(store_error)?;
        match value {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write one document against its current revision
    async fn modify<T, F>(&self, key: &str, mut change: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut(Option<T>) -> Result<T> + Send,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let entry = self.kv.entry(key.to_string()).await.map_err(store_error)?;
            let slot = match &entry {
                Some(entry) => Slot::decode(
                    (entry.operation == kv::Operation::Put).then_some(&entry.value[..]),
                    entry.revision,
                )?,
                None => Slot::vacant(),
            };

            let (next, payload, revision) = slot.rewrite(&mut change)?;
            match self.kv.update(key, payload.into(), revision).await {
                Ok(_) => return Ok(next),
                Err(e) => debug!(key, attempt, "Concurrent write, retrying: {}", e),
            }
        }

        warn!(key, "Giving up after {} conflicting writes", MAX_CAS_ATTEMPTS);
        Err(Error::Store(format!(
            "{} changed concurrently {} times in a row",
            key, MAX_CAS_ATTEMPTS
        )))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = self.kv.keys().await.map_err(store_error)?;
        let mut matching = Vec::new();
        while let Some(key) = keys.next().await {
            let key = key.map_err(store_error)?;
            if key.starts_with(prefix) {
                matching.push(key);
            }
        }
        Ok(matching)
    }
}

/// One key as last read: its live document and the revision to write against.
///
/// Revision 0 makes the write succeed only if the key has never been written.
/// A deleted key keeps the revision of its tombstone.
#[derive(Debug)]
struct Slot<T> {
    document: Option<T>,
    revision: u64,
}

impl<T: Serialize + DeserializeOwned> Slot<T> {
    fn vacant() -> Self {
        Self {
            document: None,
            revision: 0,
        }
    }

    /// `live` is the stored payload, or `None` for a tombstone
    fn decode(live: Option<&[u8]>, revision: u64) -> Result<Self> {
        let document = match live {
            Some(bytes) => Some(serde_json::from_slice(bytes)?),
            None => None,
        };
        Ok(Self { document, revision })
    }

    /// Apply `change` and serialize the result for a revision-checked write
    fn rewrite<F>(self, change: &mut F) -> Result<(T, Vec<u8>, u64)>
    where
        F: FnMut(Option<T>) -> Result<T>,
    {
        let next = change(self.document)?;
        let payload = serde_json::to_vec(&next)?;
        Ok((next, payload, self.revision))
    }
}

fn store_error(e: impl std::fmt::Display) -> Error {
    Error::Store(e.to_string())
}

fn interview_key(id: &str) -> String {
    format!("interview.{}", id)
}

fn session_prefix(interview_id: &str) -> String {
    format!("session.{}.", interview_id)
}

/// Contact identifiers contain characters keys may not, so they are encoded
fn session_key(interview_id: &str, participant: &ParticipantId) -> String {
    format!(
        "{}{}",
        session_prefix(interview_id),
        encode_token(participant.as_str())
    )
}

fn transcript_key(scope: &Scope) -> String {
    match scope {
        Scope::Interview(id) => format!("transcript.{}", id),
        Scope::Participant {
            interview_id,
            participant,
        } => format!(
            "transcript.{}.{}",
            interview_id,
            encode_token(participant.as_str())
        ),
    }
}

fn missing_interview(id: &str) -> Error {
    Error::NotFound(format!("interview {}", id))
}

#[async_trait]
impl InterviewStore for NatsKvStore {
    async fn create_interview(&self, interview: &Interview) -> Result<()> {
        let payload = serde_json::to_vec(interview)?;
        self.kv
            .update(interview_key(&interview.id), payload.into(), 0)
            .await
            .map_err(|e| Error::Store(format!("interview {} not created: {}", interview.id, e)))?;
        Ok(())
    }

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>> {
        self.read(&interview_key(id)).await
    }

    async fn list_interviews(&self) -> Result<Vec<Interview>> {
        let mut interviews = Vec::new();
        for key in self.keys_with_prefix("interview.").await? {
            if let Some(interview) = self.read::<Interview>(&key).await? {
                interviews.push(interview);
            }
        }
        interviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(interviews)
    }

    async fn update_interview_progress(
        &self,
        id: &str,
        progress: u8,
        status: Status,
    ) -> Result<Interview> {
        self.modify(&interview_key(id), |current: Option<Interview>| {
            let mut interview = current.ok_or_else(|| missing_interview(id))?;
            interview.apply_progress(progress, status);
            Ok(interview)
        })
        .await
    }

    async fn upsert_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
        update: &SessionUpdate,
    ) -> Result<Session> {
        if self.get_interview(interview_id).await?.is_none() {
            return Err(missing_interview(interview_id));
        }

        self.modify(
            &session_key(interview_id, participant),
            |current: Option<Session>| {
                let mut session = current.unwrap_or_else(|| Session::new(participant.clone()));
                session.apply(update, Utc::now());
                Ok(session)
            },
        )
        .await
    }

    async fn get_session(
        &self,
        interview_id: &str,
        participant: &ParticipantId,
    ) -> Result<Option<Session>> {
        self.read(&session_key(interview_id, participant)).await
    }

    async fn list_sessions(&self, interview_id: &str) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        for key in self.keys_with_prefix(&session_prefix(interview_id)).await? {
            if let Some(session) = self.read::<Session>(&key).await? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    async fn recompute_aggregate(&self, interview_id: &str) -> Result<Interview> {
        // The revision check on the interview document makes the recompute
        // atomic: a writer that read stale sessions loses the race and retries
        // with fresh ones.
        for _ in 0..MAX_CAS_ATTEMPTS {
            let entry = self
                .kv
                .entry(interview_key(interview_id))
                .await
                .map_err(store_error)?
                .ok_or_else(|| missing_interview(interview_id))?;

            let mut interview: Interview = serde_json::from_slice(&entry.value)?;
            let sessions = self.list_sessions(interview_id).await?;
            progress::apply_aggregate(&mut interview, &sessions);

            let payload = serde_json::to_vec(&interview)?;
            match self
                .kv
                .update(interview_key(interview_id), payload.into(), entry.revision)
                .await
            {
                Ok(_) => return Ok(interview),
                Err(e) => debug!(interview_id, "Aggregate recompute raced, retrying: {}", e),
            }
        }

        Err(Error::Store(format!(
            "aggregate for {} changed concurrently {} times in a row",
            interview_id, MAX_CAS_ATTEMPTS
        )))
    }

    async fn append_turn(&self, scope: &Scope, turn: NewTurn) -> Result<Turn> {
        if self.get_interview(scope.interview_id()).await?.is_none() {
            return Err(missing_interview(scope.interview_id()));
        }

        let mut appended = None;
        self.modify(&transcript_key(scope), |current: Option<Vec<Turn>>| {
            let mut transcript = current.unwrap_or_default();
            let timestamp = next_timestamp(transcript.last().map(|t| t.timestamp));
            let new = turn_from(turn.clone(), timestamp);
            appended = Some(new.clone());
            transcript.push(new);
            Ok(transcript)
        })
        .await?;

        appended.ok_or_else(|| Error::Store(format!("append to {} was not applied", scope)))
    }

    async fn turns(&self, scope: &Scope) -> Result<Vec<Turn>> {
        Ok(self
            .read::<Vec<Turn>>(&transcript_key(scope))
            .await?
            .unwrap_or_default())
    }

    async fn save_report(&self, scope: &Scope, report: &Report) -> Result<()> {
        let now = Utc::now();
        match scope {
            Scope::Interview(id) => {
                self.modify(&interview_key(id), |current: Option<Interview>| {
                    let mut interview = current.ok_or_else(|| missing_interview(id))?;
                    interview.report = Some(report.clone());
                    interview.report_generated_at = Some(now);
                    Ok(interview)
                })
                .await?;
            }
            Scope::Participant {
                interview_id,
                participant,
            } => {
                self.modify(
                    &session_key(interview_id, participant),
                    |current: Option<Session>| {
                        let mut session = current
                            .ok_or_else(|| Error::NotFound(format!("session {}", scope)))?;
                        session.report = Some(report.clone());
                        session.report_generated_at = Some(now);
                        Ok(session)
                    },
                )
                .await?;
            }
        }
        Ok(())
    }
}
