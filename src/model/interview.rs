use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParticipantId, Report};

/// Interview type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewKind {
    /// One participant, the interview record doubles as the session
    Solo,
    /// Several invited participants, each with a session of their own
    MultiParticipant,
}

/// Lifecycle status shared by interviews and sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Active,
    Completed,
}

/// A participant planned for a multi-participant interview
///
/// `status` and `progress` are a read cache of the participant's session,
/// rebuilt from session documents whenever the aggregate is recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedParticipant {
    pub name: String,
    pub role: String,
    pub contact: ParticipantId,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub progress: u8,
}

impl PlannedParticipant {
    pub fn new(name: &str, role: &str, contact: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            contact: ParticipantId::new(contact),
            status: Status::Pending,
            progress: 0,
        }
    }
}

/// One diagnostic engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: String,

    /// Account that created the interview
    pub owner: String,

    pub kind: InterviewKind,

    pub status: Status,

    /// 0-100; the mean of participant progress for multi-participant interviews
    pub progress: f64,

    pub created_at: DateTime<Utc>,

    /// Organization named in invitations
    #[serde(default)]
    pub organization: Option<String>,

    /// Planned participants (multi-participant only)
    #[serde(default)]
    pub participants: Vec<PlannedParticipant>,

    #[serde(default)]
    pub report: Option<Report>,

    #[serde(default)]
    pub report_generated_at: Option<DateTime<Utc>>,
}

impl Interview {
    /// A solo diagnostic, active as soon as it is created
    pub fn solo(owner: &str) -> Self {
        Self {
            id: format!("interview-{}", uuid::Uuid::new_v4()),
            owner: owner.to_string(),
            kind: InterviewKind::Solo,
            status: Status::Active,
            progress: 0.0,
            created_at: Utc::now(),
            organization: None,
            participants: Vec::new(),
            report: None,
            report_generated_at: None,
        }
    }

    /// A multi-participant diagnostic, pending until someone opens it
    pub fn multi_participant(
        owner: &str,
        participants: Vec<PlannedParticipant>,
        organization: Option<String>,
    ) -> Self {
        Self {
            id: format!("interview-{}", uuid::Uuid::new_v4()),
            owner: owner.to_string(),
            kind: InterviewKind::MultiParticipant,
            status: Status::Pending,
            progress: 0.0,
            created_at: Utc::now(),
            organization,
            participants,
            report: None,
            report_generated_at: None,
        }
    }

    pub fn is_owner(&self, account: Option<&str>) -> bool {
        account.is_some_and(|a| a == self.owner)
    }

    pub fn participant(&self, contact: &ParticipantId) -> Option<&PlannedParticipant> {
        self.participants.iter().find(|p| &p.contact == contact)
    }

    /// Merge a progress update into a solo interview.
    ///
    /// Progress never decreases and a completed interview stays completed.
    pub fn apply_progress(&mut self, progress: u8, status: Status) {
        self.progress = self.progress.max(progress.min(100) as f64);
        if self.status != Status::Completed {
            self.status = status;
        }
        if self.status == Status::Completed {
            self.progress = 100.0;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}
