//! Interview sessions
//!
//! This module provides:
//! - `InterviewMachine`: the pure turn cycle (listen, transcribe, reply, speak)
//! - `InterviewSession`: drives the machine against collaborators and the store
//! - `InterviewService`: creation, listing, sessions and reports

mod config;
mod context;
mod machine;
mod service;
mod session;
mod snapshot;

pub use config::InterviewPolicy;
pub use context::build_agent_context;
pub use machine::{Command, InterviewEvent, InterviewMachine, InterviewState};
pub use service::{validate_participants, InterviewService, ParticipantInput};
pub use session::{InterviewSession, TurnOutcome};
pub use snapshot::SessionSnapshot;
