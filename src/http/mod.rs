//! HTTP API for the interview front end
//!
//! Identity comes from the auth gateway headers (`x-account-id`,
//! `x-account-email`) and from the `u` invitation parameter.
//! - GET /health - Health check
//! - POST /interviews - Create a solo diagnostic
//! - POST /interviews/enterprise - Create a multi-participant interview
//! - GET /interviews - Interviews owned by or open to the caller
//! - GET /interviews/:id/participant - Caller's invited name and role
//! - GET /interviews/:id/session - Session state
//! - POST /interviews/:id/session/{start,turn,playback-ended,finish} - Turn cycle
//! - GET /interviews/:id/session/transcript - Visible transcript
//! - GET|POST /interviews/:id/report - View or compile a report

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, TurnResponse, ACCOUNT_EMAIL_HEADER, ACCOUNT_ID_HEADER};
pub use routes::create_router;
pub use state::AppState;
