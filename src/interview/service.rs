use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::config::InterviewPolicy;
use super::session::InterviewSession;
use crate::access::{authorize, authorize_participation, Access};
use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::identity::{Account, ActingIdentity};
use crate::invitations::{InvitationDispatch, Invitations};
use crate::model::{
    Interview, InterviewKind, ParticipantId, PlannedParticipant, Report, Scope,
};
use crate::report::ReportCompiler;
use crate::store::InterviewStore;

/// A participant as entered when setting up a multi-participant interview
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantInput {
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub contact: String,
}

/// Entry point for every interview operation, built once at startup
pub struct InterviewService {
    store: Arc<dyn InterviewStore>,
    collaborators: Collaborators,
    reports: Arc<ReportCompiler>,
    invitations: Invitations,
    policy: InterviewPolicy,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        collaborators: Collaborators,
        invitations: Invitations,
        policy: InterviewPolicy,
    ) -> Self {
        let reports = Arc::new(ReportCompiler::new(
            Arc::clone(&store),
            Arc::clone(&collaborators.reports),
        ));

        Self {
            store,
            collaborators,
            reports,
            invitations,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn InterviewStore> {
        &self.store
    }

    pub fn reports(&self) -> &Arc<ReportCompiler> {
        &self.reports
    }

    pub fn policy(&self) -> &InterviewPolicy {
        &self.policy
    }

    pub async fn create_solo(&self, account: &Account) -> Result<Interview> {
        let interview = Interview::solo(&account.id);
        self.store.create_interview(&interview).await?;

        info!(interview_id = %interview.id, owner = %account.id, "Created solo interview");

        Ok(interview)
    }

    /// Create a multi-participant interview and invite its participants
    pub async fn create_multi(
        &self,
        account: &Account,
        participants: Vec<ParticipantInput>,
        organization: Option<String>,
    ) -> Result<(Interview, InvitationDispatch)> {
        let participants = validate_participants(participants)?;
        let organization = organization
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        let interview = Interview::multi_participant(&account.id, participants, organization);
        self.store.create_interview(&interview).await?;

        info!(
            interview_id = %interview.id,
            owner = %account.id,
            "Created interview with {} participants",
            interview.participants.len()
        );

        let dispatch = self.invitations.dispatch(&interview).await?;

        Ok((interview, dispatch))
    }

    pub async fn get_interview(&self, id: &str) -> Result<Interview> {
        self.store
            .get_interview(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("interview {}", id)))
    }

    /// Interviews the viewer owns or is invited to, newest first
    pub async fn list_for_viewer(&self, viewer: &ActingIdentity) -> Result<Vec<Interview>> {
        let interviews = self.store.list_interviews().await?;
        Ok(interviews
            .into_iter()
            .filter(|i| {
                i.is_owner(viewer.account.as_deref()) || i.participant(&viewer.participant).is_some()
            })
            .collect())
    }

    /// Name and role the viewer was invited with
    pub async fn participant_info(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
    ) -> Result<PlannedParticipant> {
        let interview = self.get_interview(interview_id).await?;
        interview
            .participant(&viewer.participant)
            .cloned()
            .ok_or(Error::Forbidden)
    }

    /// Open a live session for the viewer
    pub async fn open_session(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
    ) -> Result<InterviewSession> {
        let interview = self.get_interview(interview_id).await?;
        InterviewSession::open(
            interview,
            viewer,
            Arc::clone(&self.store),
            self.collaborators.clone(),
            Arc::clone(&self.reports),
            self.policy.clone(),
        )
        .await
    }

    /// Scope the viewer's own session of an interview lives under
    pub async fn session_scope(&self, viewer: &ActingIdentity, interview_id: &str) -> Result<Scope> {
        let interview = self.get_interview(interview_id).await?;
        if authorize_participation(viewer, &interview) == Access::Deny {
            return Err(Error::Forbidden);
        }

        Ok(match interview.kind {
            InterviewKind::Solo => Scope::Interview(interview.id),
            InterviewKind::MultiParticipant => Scope::Participant {
                interview_id: interview.id,
                participant: viewer.participant.clone(),
            },
        })
    }

    /// The report the viewer asked for, if it has been compiled
    pub async fn view_report(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
        requested: Option<&ParticipantId>,
    ) -> Result<Option<Report>> {
        let (interview, scope) = self.report_scope(viewer, interview_id, requested).await?;

        match scope {
            Scope::Interview(_) => Ok(interview.report),
            Scope::Participant {
                interview_id,
                participant,
            } => Ok(self
                .store
                .get_session(&interview_id, &participant)
                .await?
                .and_then(|s| s.report)),
        }
    }

    /// Compile (or recompile) the report the viewer asked for
    pub async fn compile_report(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
        requested: Option<&ParticipantId>,
    ) -> Result<Report> {
        let (_, scope) = self.report_scope(viewer, interview_id, requested).await?;
        self.reports.compile(&scope).await
    }

    async fn report_scope(
        &self,
        viewer: &ActingIdentity,
        interview_id: &str,
        requested: Option<&ParticipantId>,
    ) -> Result<(Interview, Scope)> {
        let interview = self.get_interview(interview_id).await?;

        if authorize(viewer, &interview, requested) == Access::Deny {
            return Err(Error::Forbidden);
        }

        let scope = match (interview.kind, requested) {
            (InterviewKind::MultiParticipant, Some(participant)) => {
                if interview.participant(participant).is_none() {
                    return Err(Error::NotFound(format!("participant {}", participant)));
                }
                Scope::Participant {
                    interview_id: interview.id.clone(),
                    participant: participant.clone(),
                }
            }
            _ => Scope::Interview(interview.id.clone()),
        };

        Ok((interview, scope))
    }
}

/// Trim, normalize and check participants entered at setup
pub fn validate_participants(inputs: Vec<ParticipantInput>) -> Result<Vec<PlannedParticipant>> {
    let mut seen = HashSet::new();
    let mut participants = Vec::with_capacity(inputs.len());

    for input in inputs {
        let participant = PlannedParticipant::new(&input.name, &input.role, &input.contact);
        if participant.name.is_empty() || participant.contact.is_empty() {
            return Err(Error::InvalidInput(
                "every participant needs a name and a contact".to_string(),
            ));
        }
        if !seen.insert(participant.contact.clone()) {
            return Err(Error::InvalidInput(format!(
                "participant {} is listed twice",
                participant.contact
            )));
        }
        participants.push(participant);
    }

    if participants.is_empty() {
        return Err(Error::InvalidInput(
            "at least one participant is required".to_string(),
        ));
    }

    Ok(participants)
}
