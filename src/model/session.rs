use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParticipantId, Report, Status};

/// One participant's progress within a multi-participant interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub participant: ParticipantId,

    /// Account the participant was signed in with, if any
    #[serde(default)]
    pub account: Option<String>,

    pub status: Status,

    pub progress: u8,

    pub last_active: DateTime<Utc>,

    /// Individual report, independent of the interview's aggregate report
    #[serde(default)]
    pub report: Option<Report>,

    #[serde(default)]
    pub report_generated_at: Option<DateTime<Utc>>,
}

/// Partial session write; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub status: Option<Status>,
    pub progress: Option<u8>,
    pub account: Option<String>,
}

impl Session {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            account: None,
            status: Status::Pending,
            progress: 0,
            last_active: Utc::now(),
            report: None,
            report_generated_at: None,
        }
    }

    /// Merge a partial update into this session.
    ///
    /// Progress never decreases and a completed session stays completed.
    pub fn apply(&mut self, update: &SessionUpdate, now: DateTime<Utc>) {
        if let Some(progress) = update.progress {
            self.progress = self.progress.max(progress.min(100));
        }

        if let Some(status) = update.status {
            if self.status != Status::Completed {
                self.status = status;
            }
        }

        if self.status == Status::Completed {
            self.progress = 100;
        }

        if let Some(account) = &update.account {
            self.account = Some(account.clone());
        }

        self.last_active = now;
    }
}
