use std::fmt::Write;

use crate::collaborators::ReportFraming;
use crate::error::{Error, Result};
use crate::model::{Interview, InterviewKind, PlannedParticipant, Scope, Speaker, Turn};
use crate::store::InterviewStore;

/// Transcript text handed to the report generator
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub transcript: String,
    pub framing: ReportFraming,
}

/// Assemble the transcript a report for `scope` is compiled from.
///
/// Solo and individual reports use one transcript; the aggregate report of a
/// multi-participant interview concatenates every session, labeled by
/// participant and role. Priming turns never appear.
pub async fn assemble(
    store: &dyn InterviewStore,
    interview: &Interview,
    scope: &Scope,
) -> Result<ReportInput> {
    let mut transcript = String::new();

    let framing = match (interview.kind, scope) {
        (InterviewKind::Solo, _) => {
            let turns = store.turns(&Scope::Interview(interview.id.clone())).await?;
            write_turns(&mut transcript, &turns);
            ReportFraming::Individual
        }
        (InterviewKind::MultiParticipant, Scope::Participant { participant, .. }) => {
            let planned = interview
                .participant(participant)
                .ok_or_else(|| Error::NotFound(format!("participant {}", participant)))?;
            let turns = store.turns(scope).await?;
            write_section(&mut transcript, planned, &turns);
            ReportFraming::Individual
        }
        (InterviewKind::MultiParticipant, Scope::Interview(_)) => {
            for planned in &interview.participants {
                let session = Scope::Participant {
                    interview_id: interview.id.clone(),
                    participant: planned.contact.clone(),
                };
                let turns = store.turns(&session).await?;
                write_section(&mut transcript, planned, &turns);
            }
            ReportFraming::Consolidated
        }
    };

    if transcript.trim().is_empty() {
        return Err(Error::EmptyTranscript);
    }

    Ok(ReportInput {
        transcript,
        framing,
    })
}

fn write_section(out: &mut String, planned: &PlannedParticipant, turns: &[Turn]) {
    if !turns.iter().any(|t| !t.synthetic) {
        return;
    }

    let _ = writeln!(
        out,
        "=== {} ({}, {}) ===",
        planned.name, planned.role, planned.contact
    );
    write_turns(out, turns);
    out.push('\n');
}

fn write_turns(out: &mut String, turns: &[Turn]) {
    for turn in turns.iter().filter(|t| !t.synthetic) {
        let label = match turn.speaker {
            Speaker::Participant => "Participant",
            Speaker::Agent => "Interviewer",
        };
        let _ = writeln!(out, "{}: {}", label, turn.text);
    }
}
