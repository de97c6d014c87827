use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::config::InterviewPolicy;
use super::context::build_agent_context;
use super::machine::{Command, InterviewEvent, InterviewMachine, InterviewState};
use super::snapshot::SessionSnapshot;
use crate::access::{authorize_participation, Access};
use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::identity::ActingIdentity;
use crate::model::{Interview, InterviewKind, ParticipantId, Scope, SessionUpdate, Status, Turn};
use crate::progress::compute_progress;
use crate::report::ReportCompiler;
use crate::store::InterviewStore;

/// What one driven event produced
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub state: Option<InterviewState>,
    /// Participant text as transcribed
    pub transcript: Option<String>,
    pub reply: Option<String>,
    /// Synthesized reply audio
    pub audio: Option<Vec<u8>>,
    pub progress: Option<u8>,
    /// Set when a collaborator failed and the turn was dropped
    pub aborted: Option<String>,
}

struct Turns {
    machine: InterviewMachine,
    /// Persisted turns, oldest first
    history: Vec<Turn>,
}

/// One participant's live interview, driving the turn machine
pub struct InterviewSession {
    interview: Interview,
    scope: Scope,
    participant: ParticipantId,
    /// Signed-in account of the participant, recorded on their session
    account: Option<String>,
    store: Arc<dyn InterviewStore>,
    collaborators: Collaborators,
    reports: Arc<ReportCompiler>,
    policy: InterviewPolicy,
    opened_at: DateTime<Utc>,
    /// Held for a whole event, so one participant has one turn in flight
    turns: Mutex<Turns>,
}

impl InterviewSession {
    /// Open `interview` for `identity`, resuming any persisted history
    pub async fn open(
        interview: Interview,
        identity: &ActingIdentity,
        store: Arc<dyn InterviewStore>,
        collaborators: Collaborators,
        reports: Arc<ReportCompiler>,
        policy: InterviewPolicy,
    ) -> Result<Self> {
        if authorize_participation(identity, &interview) == Access::Deny {
            return Err(Error::Forbidden);
        }

        let (scope, completed) = match interview.kind {
            InterviewKind::Solo => (
                Scope::Interview(interview.id.clone()),
                interview.is_completed(),
            ),
            InterviewKind::MultiParticipant => {
                let completed = store
                    .get_session(&interview.id, &identity.participant)
                    .await?
                    .is_some_and(|s| s.status == Status::Completed);

                (
                    Scope::Participant {
                        interview_id: interview.id.clone(),
                        participant: identity.participant.clone(),
                    },
                    completed,
                )
            }
        };

        let history = store.turns(&scope).await?;
        let machine = InterviewMachine::resume(history.len(), completed, policy.max_turns);

        info!(
            interview_id = %interview.id,
            participant = %identity.participant,
            state = ?machine.state(),
            "Opened interview session with {} persisted turns",
            history.len()
        );

        Ok(Self {
            participant: identity.participant.clone(),
            account: identity.account.clone(),
            interview,
            scope,
            store,
            collaborators,
            reports,
            policy,
            opened_at: Utc::now(),
            turns: Mutex::new(Turns { machine, history }),
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Begin the interview: prime the agent and speak its greeting
    pub async fn start(&self) -> Result<TurnOutcome> {
        self.drive(InterviewEvent::Start).await
    }

    /// Run one participant turn from a finished recording
    pub async fn submit_audio(&self, audio: Vec<u8>) -> Result<TurnOutcome> {
        self.drive(InterviewEvent::RecordingStopped { audio }).await
    }

    /// The agent's reply finished playing
    pub async fn playback_ended(&self) -> Result<InterviewState> {
        let mut turns = self.turns.lock().await;
        turns.machine.advance(InterviewEvent::PlaybackEnded)
    }

    /// Mark the interview finished. Calling it again changes nothing.
    pub async fn finish(&self) -> Result<TurnOutcome> {
        self.drive(InterviewEvent::Finish).await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let turns = self.turns.lock().await;
        let state = turns.machine.state();

        SessionSnapshot {
            interview_id: self.interview.id.clone(),
            participant: self.participant.clone(),
            kind: self.interview.kind,
            state,
            turn_count: turns.machine.turn_count(),
            max_turns: turns.machine.max_turns(),
            progress: compute_progress(
                turns.machine.turn_count(),
                state == InterviewState::Finished,
            ),
            opened_at: self.opened_at,
        }
    }

    /// Visible transcript, priming messages left out
    pub async fn transcript(&self) -> Vec<Turn> {
        let turns = self.turns.lock().await;
        turns
            .history
            .iter()
            .filter(|t| !t.synthetic)
            .cloned()
            .collect()
    }

    async fn drive(&self, event: InterviewEvent) -> Result<TurnOutcome> {
        let mut turns = self.turns.lock().await;
        let turns = &mut *turns;
        let mut outcome = TurnOutcome::default();

        let starting = event == InterviewEvent::Start;
        turns.machine.advance(event)?;

        if starting {
            if let Err(e) = self.mark_started().await {
                turns.machine.abort_turn(turns.history.len());
                return Err(e);
            }
        }

        while let Some(command) = turns.machine.next_command() {
            match command {
                Command::Transcribe { audio } => {
                    let result = self
                        .collaborators
                        .transcriber
                        .transcribe(&self.scope.to_string(), &audio)
                        .await;

                    match result {
                        Ok(text) => {
                            outcome.transcript = Some(text.clone());
                            turns.machine.advance(InterviewEvent::Transcribed { text })?;
                        }
                        Err(e) => self.collaborator_failed(turns, "transcriber", e, &mut outcome)?,
                    }
                }

                Command::PersistTurn(turn) => match self.store.append_turn(&self.scope, turn).await
                {
                    Ok(turn) => turns.history.push(turn),
                    Err(e) => {
                        warn!(scope = %self.scope, "Dropping turn, persistence failed: {}", e);
                        turns.machine.abort_turn(turns.history.len());
                        return Err(e);
                    }
                },

                Command::RequestReply { text } => {
                    // The new text was just persisted as the last turn
                    let earlier = &turns.history[..turns.history.len().saturating_sub(1)];
                    let context = build_agent_context(
                        self.store.as_ref(),
                        &self.interview,
                        &self.participant,
                        self.policy.context_window,
                    )
                    .await;

                    let result = self
                        .collaborators
                        .chat
                        .reply(earlier, &text, context.as_ref())
                        .await;

                    match result {
                        Ok(reply) => {
                            outcome.reply = Some(reply.clone());
                            turns
                                .machine
                                .advance(InterviewEvent::ReplyReceived { text: reply })?;
                        }
                        Err(e) => self.collaborator_failed(turns, "chat agent", e, &mut outcome)?,
                    }
                }

                Command::UpdateProgress { progress } => {
                    self.record_progress(progress).await;
                    outcome.progress = Some(progress);
                }

                Command::Synthesize { text } => {
                    let result = self
                        .collaborators
                        .speech
                        .synthesize(&self.scope.to_string(), &text)
                        .await;

                    match result {
                        Ok(audio) => outcome.audio = Some(audio),
                        Err(e) => {
                            self.collaborator_failed(turns, "speech synthesizer", e, &mut outcome)?
                        }
                    }
                }

                Command::Complete => {
                    if let Err(e) = self.complete().await {
                        turns.machine.abort_turn(turns.history.len());
                        return Err(e);
                    }
                    outcome.progress = Some(100);
                }
            }
        }

        outcome.state = Some(turns.machine.state());
        Ok(outcome)
    }

    fn collaborator_failed(
        &self,
        turns: &mut Turns,
        collaborator: &'static str,
        err: anyhow::Error,
        outcome: &mut TurnOutcome,
    ) -> Result<()> {
        let err = Error::collaborator(collaborator, err);
        warn!(scope = %self.scope, "Turn aborted: {}", err);
        outcome.aborted = Some(err.to_string());
        turns.machine.advance(InterviewEvent::CollaboratorFailed)?;
        Ok(())
    }

    /// Create the participant's session document once they actually begin
    async fn mark_started(&self) -> Result<()> {
        let Scope::Participant {
            interview_id,
            participant,
        } = &self.scope
        else {
            return Ok(());
        };

        let update = SessionUpdate {
            status: Some(Status::Active),
            progress: None,
            account: self.account.clone(),
        };
        self.store
            .upsert_session(interview_id, participant, &update)
            .await?;
        self.store.recompute_aggregate(interview_id).await?;

        info!(interview_id = %interview_id, participant = %participant, "Participant started");
        Ok(())
    }

    /// Persist organic progress; failures only cost a stale progress bar
    async fn record_progress(&self, progress: u8) {
        let result = match &self.scope {
            Scope::Interview(id) => self
                .store
                .update_interview_progress(id, progress, Status::Active)
                .await
                .map(|_| ()),
            Scope::Participant {
                interview_id,
                participant,
            } => {
                let update = SessionUpdate {
                    status: Some(Status::Active),
                    progress: Some(progress),
                    account: None,
                };
                match self
                    .store
                    .upsert_session(interview_id, participant, &update)
                    .await
                {
                    Ok(_) => self.store.recompute_aggregate(interview_id).await.map(|_| ()),
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            warn!(scope = %self.scope, "Failed to record progress {}: {}", progress, e);
        }
    }

    async fn complete(&self) -> Result<()> {
        let auto = self.policy.auto_compile_reports;

        match &self.scope {
            Scope::Interview(id) => {
                self.store
                    .update_interview_progress(id, 100, Status::Completed)
                    .await?;
                info!(interview_id = %id, "Solo interview completed");

                if auto {
                    self.reports.compile_on_completion(self.scope.clone());
                }
            }
            Scope::Participant {
                interview_id,
                participant,
            } => {
                let update = SessionUpdate {
                    status: Some(Status::Completed),
                    progress: Some(100),
                    account: None,
                };
                self.store
                    .upsert_session(interview_id, participant, &update)
                    .await?;
                let interview = self.store.recompute_aggregate(interview_id).await?;

                info!(
                    interview_id = %interview_id,
                    participant = %participant,
                    aggregate = interview.progress,
                    "Participant finished"
                );

                if auto {
                    self.reports.compile_on_completion(self.scope.clone());
                    if interview.is_completed() {
                        self.reports
                            .compile_on_completion(Scope::Interview(interview_id.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}
