use tracing::warn;

use crate::collaborators::{AgentContext, ParticipantExcerpt, TeamMember};
use crate::model::{Interview, InterviewKind, ParticipantId, Scope};
use crate::store::InterviewStore;

/// Build the agent context for `participant`'s next reply.
///
/// Best effort: a transcript that cannot be read is left out.
pub async fn build_agent_context(
    store: &dyn InterviewStore,
    interview: &Interview,
    participant: &ParticipantId,
    window: usize,
) -> Option<AgentContext> {
    if interview.kind != InterviewKind::MultiParticipant {
        return None;
    }

    let role = interview
        .participant(participant)
        .map(|p| p.role.clone())
        .unwrap_or_default();

    let others: Vec<_> = interview
        .participants
        .iter()
        .filter(|p| &p.contact != participant)
        .collect();

    let team = others
        .iter()
        .map(|p| TeamMember {
            name: p.name.clone(),
            role: p.role.clone(),
        })
        .collect();

    let mut shared = Vec::new();
    if window > 0 {
        for other in &others {
            let scope = Scope::Participant {
                interview_id: interview.id.clone(),
                participant: other.contact.clone(),
            };

            // Priming turns are skipped before taking the window
            match store.turns(&scope).await {
                Ok(turns) => {
                    let mut turns: Vec<_> = turns.into_iter().filter(|t| !t.synthetic).collect();
                    let skip = turns.len().saturating_sub(window);
                    let turns = turns.split_off(skip);
                    if !turns.is_empty() {
                        shared.push(ParticipantExcerpt {
                            participant: other.contact.clone(),
                            turns,
                        });
                    }
                }
                Err(e) => warn!(
                    interview_id = %interview.id,
                    participant = %other.contact,
                    "Leaving transcript out of shared context: {}",
                    e
                ),
            }
        }
    }

    Some(AgentContext {
        participant: Some(participant.clone()),
        role,
        team,
        shared,
    })
}
