//! Who may see what
//!
//! Rules, in order:
//! 1. The interview owner may view anything under the interview.
//! 2. A planned participant of a multi-participant interview may view their
//!    own session and report. Solo interviews have no such sessions.
//! 3. Everything else is denied.

use crate::identity::ActingIdentity;
use crate::model::{Interview, InterviewKind, ParticipantId};

/// Authorization outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Decide whether `viewer` may read the interview, or one participant's
/// session within it when `requested` is set.
pub fn authorize(
    viewer: &ActingIdentity,
    interview: &Interview,
    requested: Option<&ParticipantId>,
) -> Access {
    if interview.is_owner(viewer.account.as_deref()) {
        return Access::Allow;
    }

    let own_session = match (interview.kind, requested) {
        (InterviewKind::MultiParticipant, Some(participant)) => {
            participant == &viewer.participant && interview.participant(participant).is_some()
        }
        _ => false,
    };

    if own_session {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// Decide whether `viewer` may conduct an interview session.
///
/// Solo interviews are run by their owner; multi-participant interviews by
/// their planned participants.
pub fn authorize_participation(viewer: &ActingIdentity, interview: &Interview) -> Access {
    let allowed = match interview.kind {
        InterviewKind::Solo => interview.is_owner(viewer.account.as_deref()),
        InterviewKind::MultiParticipant => interview.participant(&viewer.participant).is_some(),
    };

    if allowed {
        Access::Allow
    } else {
        Access::Deny
    }
}
