//! Error types for interview operations

use thiserror::Error;

use crate::interview::InterviewState;

/// Result type for interview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the interview core
#[derive(Error, Debug)]
pub enum Error {
    /// Interview, session or participant does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The acting identity may not perform this operation
    #[error("Access denied")]
    Forbidden,

    /// No authenticated account and no decodable invitation token
    #[error("No identity could be resolved for this request")]
    Unidentified,

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Event not accepted in the current state
    #[error("Event {event} is not valid in state {state:?}")]
    InvalidTransition {
        state: InterviewState,
        event: &'static str,
    },

    /// The session was finished and accepts no further turns
    #[error("Session already finished")]
    SessionFinished,

    /// The session reached the configured turn limit
    #[error("Turn limit of {0} messages reached, finish the interview to continue")]
    TurnLimitReached(usize),

    /// An external collaborator (speech, chat, report) failed
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// Report payload could not be normalized into a report
    #[error("Malformed report payload: {0}")]
    MalformedReport(String),

    /// A report for the same interview or session is already being compiled
    #[error("Report is already being compiled")]
    ReportInProgress,

    /// Nothing has been said yet, there is nothing to analyze
    #[error("No transcript available to analyze")]
    EmptyTranscript,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Document (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn collaborator(collaborator: &'static str, err: anyhow::Error) -> Self {
        Error::Collaborator {
            collaborator,
            message: format!("{:#}", err),
        }
    }
}
