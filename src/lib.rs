pub mod access;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod interview;
pub mod invitations;
pub mod model;
pub mod nats;
pub mod progress;
pub mod report;
pub mod store;

pub use access::{authorize, authorize_participation, Access};
pub use collaborators::Collaborators;
pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use identity::{resolve, ActingIdentity, RequestContext};
pub use interview::{
    InterviewEvent, InterviewMachine, InterviewPolicy, InterviewService, InterviewSession,
    InterviewState,
};
pub use invitations::{InvitationDispatch, Invitations};
pub use nats::NatsClient;
pub use progress::compute_progress;
pub use report::ReportCompiler;
pub use store::{InterviewStore, MemoryStore, NatsKvStore};
