//! Completion progress
//!
//! Organic conversation never reaches 100%: completion is always an explicit
//! participant action.

use crate::model::{Interview, InterviewKind, PlannedParticipant, Session, Status};

/// Highest progress reachable without an explicit finish
pub const ORGANIC_CAP: u8 = 95;

/// Progress for a transcript of `turn_count` messages.
///
/// `round(turn_count / 2 * 5)` capped at 95, or exactly 100 when forced.
pub fn compute_progress(turn_count: usize, forced_complete: bool) -> u8 {
    if forced_complete {
        return 100;
    }

    // round(2.5 * n) with halves rounding up
    let scaled = turn_count.saturating_mul(5).saturating_add(1) / 2;
    scaled.min(ORGANIC_CAP as usize) as u8
}

/// Aggregate state of a multi-participant interview
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub progress: f64,
    pub status: Status,
    pub participants: Vec<PlannedParticipant>,
}

/// Rebuild the participant cache and aggregate progress from session documents.
///
/// Participants without a session count as 0. The interview is completed
/// exactly when every planned participant has finished.
pub fn aggregate(planned: &[PlannedParticipant], sessions: &[Session]) -> Aggregate {
    let participants: Vec<PlannedParticipant> = planned
        .iter()
        .map(|p| {
            let session = sessions.iter().find(|s| s.participant == p.contact);
            PlannedParticipant {
                status: session.map(|s| s.status).unwrap_or(Status::Pending),
                progress: session.map(|s| s.progress).unwrap_or(0),
                ..p.clone()
            }
        })
        .collect();

    if participants.is_empty() {
        return Aggregate {
            progress: 0.0,
            status: Status::Pending,
            participants,
        };
    }

    let total: u32 = participants.iter().map(|p| p.progress as u32).sum();
    let progress = total as f64 / participants.len() as f64;

    let status = if participants.iter().all(|p| p.progress == 100) {
        Status::Completed
    } else if participants.iter().any(|p| p.status != Status::Pending) {
        Status::Active
    } else {
        Status::Pending
    };

    Aggregate {
        progress,
        status,
        participants,
    }
}

/// Apply a recomputed aggregate to a multi-participant interview
pub fn apply_aggregate(interview: &mut Interview, sessions: &[Session]) {
    if interview.kind != InterviewKind::MultiParticipant {
        return;
    }

    let aggregate = aggregate(&interview.participants, sessions);
    interview.participants = aggregate.participants;
    interview.progress = aggregate.progress;
    interview.status = aggregate.status;
}
