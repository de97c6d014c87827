use super::state::AppState;
use crate::error::Error;
use crate::identity::{self, Account, ActingIdentity, RequestContext};
use crate::interview::{InterviewState, ParticipantInput, TurnOutcome};
use crate::invitations::InvitationDispatch;
use crate::model::{Interview, ParticipantId, Turn};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const ACCOUNT_EMAIL_HEADER: &str = "x-account-email";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Invitation token carried by links
#[derive(Debug, Default, Deserialize)]
pub struct IdentityQuery {
    pub u: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEnterpriseRequest {
    pub participants: Vec<ParticipantInput>,

    /// Organization named in the invitations
    pub organization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateEnterpriseResponse {
    pub interview: Interview,
    pub invitations: InvitationDispatch,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub state: Option<InterviewState>,
    pub transcript: Option<String>,
    pub reply: Option<String>,

    /// Base64 reply audio
    pub audio: Option<String>,

    pub progress: Option<u8>,
    pub aborted: Option<String>,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            state: outcome.state,
            transcript: outcome.transcript,
            reply: outcome.reply,
            audio: outcome
                .audio
                .map(|audio| base64::engine::general_purpose::STANDARD.encode(audio)),
            progress: outcome.progress,
            aborted: outcome.aborted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: InterviewState,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Identity and errors
// ============================================================================

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Account forwarded by the auth gateway, if any
fn account(headers: &HeaderMap) -> Option<Account> {
    Some(Account {
        id: header(headers, ACCOUNT_ID_HEADER)?,
        email: header(headers, ACCOUNT_EMAIL_HEADER)?,
    })
}

fn acting_identity(headers: &HeaderMap, query: &IdentityQuery) -> Result<ActingIdentity, Error> {
    let ctx = RequestContext {
        account: account(headers),
        invitation_token: query.u.clone(),
    };
    identity::resolve(&ctx).ok_or(Error::Unidentified)
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Forbidden => StatusCode::FORBIDDEN,
        Error::Unidentified => StatusCode::UNAUTHORIZED,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::InvalidTransition { .. }
        | Error::SessionFinished
        | Error::TurnLimitReached(_)
        | Error::ReportInProgress => StatusCode::CONFLICT,
        Error::EmptyTranscript => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Collaborator { .. } | Error::MalformedReport(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_) | Error::Store(_) | Error::Serialization(_) => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Session commands answer an unknown interview as if it were someone else's
fn session_error(err: Error) -> Response {
    match err {
        Error::NotFound(_) => error_response(Error::Forbidden),
        other => error_response(other),
    }
}

/// Reads answer denial and absence the same way: a redirect, no body
fn read_error(state: &AppState, err: Error) -> Response {
    match err {
        Error::Forbidden | Error::NotFound(_) | Error::Unidentified => {
            Redirect::to(&state.denied_redirect).into_response()
        }
        other => error_response(other),
    }
}

// ============================================================================
// Interviews
// ============================================================================

/// POST /interviews
/// Create a solo diagnostic for the signed-in account
pub async fn create_solo(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(account) = account(&headers) else {
        return error_response(Error::Unidentified);
    };

    match state.service.create_solo(&account).await {
        Ok(interview) => (StatusCode::CREATED, Json(interview)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interviews/enterprise
/// Create a multi-participant interview and send invitations
pub async fn create_enterprise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEnterpriseRequest>,
) -> impl IntoResponse {
    let Some(account) = account(&headers) else {
        return error_response(Error::Unidentified);
    };

    match state
        .service
        .create_multi(&account, req.participants, req.organization)
        .await
    {
        Ok((interview, invitations)) => (
            StatusCode::CREATED,
            Json(CreateEnterpriseResponse {
                interview,
                invitations,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /interviews
/// Interviews the caller owns or is invited to
pub async fn list_interviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let viewer = match acting_identity(&headers, &query) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    match state.service.list_for_viewer(&viewer).await {
        Ok(interviews) => (StatusCode::OK, Json(interviews)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /interviews/:interview_id/participant
/// Name and role the caller was invited with
pub async fn participant_info(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let result = match acting_identity(&headers, &query) {
        Ok(viewer) => state.service.participant_info(&viewer, &interview_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(participant) => (StatusCode::OK, Json(participant)).into_response(),
        Err(e) => read_error(&state, e),
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// POST /interviews/:interview_id/session/start
/// Prime the agent and return its spoken greeting
pub async fn start_session(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let viewer = match acting_identity(&headers, &query) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    let session = match state.session_for(&viewer, &interview_id).await {
        Ok(session) => session,
        Err(e) => return session_error(e),
    };

    info!(interview_id = %interview_id, participant = %viewer.participant, "Starting interview");

    match session.start().await {
        Ok(outcome) => (StatusCode::OK, Json(TurnResponse::from(outcome))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interviews/:interview_id/session/turn
/// Run one turn from a recording sent as the raw request body
pub async fn submit_turn(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
    body: Bytes,
) -> impl IntoResponse {
    let viewer = match acting_identity(&headers, &query) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    let session = match state.session_for(&viewer, &interview_id).await {
        Ok(session) => session,
        Err(e) => return session_error(e),
    };

    match session.submit_audio(body.to_vec()).await {
        Ok(outcome) => (StatusCode::OK, Json(TurnResponse::from(outcome))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interviews/:interview_id/session/playback-ended
pub async fn playback_ended(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let viewer = match acting_identity(&headers, &query) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    let session = match state.session_for(&viewer, &interview_id).await {
        Ok(session) => session,
        Err(e) => return session_error(e),
    };

    match session.playback_ended().await {
        Ok(state) => (StatusCode::OK, Json(StateResponse { state })).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interviews/:interview_id/session/finish
/// Confirm the interview is over; safe to repeat
pub async fn finish_session(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let viewer = match acting_identity(&headers, &query) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(e),
    };

    let session = match state.session_for(&viewer, &interview_id).await {
        Ok(session) => session,
        Err(e) => return session_error(e),
    };

    match session.finish().await {
        Ok(outcome) => {
            state.close_session(session.scope()).await;
            info!(interview_id = %interview_id, participant = %viewer.participant, "Interview finished");
            (StatusCode::OK, Json(TurnResponse::from(outcome))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /interviews/:interview_id/session
/// Current state of the caller's session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let result = match acting_identity(&headers, &query) {
        Ok(viewer) => state.session_for(&viewer, &interview_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(session) => (StatusCode::OK, Json(session.snapshot().await)).into_response(),
        Err(e) => read_error(&state, e),
    }
}

/// GET /interviews/:interview_id/session/transcript
/// Visible transcript of the caller's session
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let result = match acting_identity(&headers, &query) {
        Ok(viewer) => state.session_for(&viewer, &interview_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(session) => {
            let transcript: Vec<Turn> = session.transcript().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        Err(e) => read_error(&state, e),
    }
}

// ============================================================================
// Reports
// ============================================================================

fn requested_participant(query: &IdentityQuery) -> Option<ParticipantId> {
    query
        .u
        .as_deref()
        .and_then(identity::decode_token)
        .map(|contact| ParticipantId::new(&contact))
}

/// GET /interviews/:interview_id/report
/// The aggregate or solo report, or an individual one with `?u=`
pub async fn get_report(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let requested = requested_participant(&query);
    let result = match acting_identity(&headers, &query) {
        Ok(viewer) => {
            state
                .service
                .view_report(&viewer, &interview_id, requested.as_ref())
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Report has not been compiled yet".to_string(),
            }),
        )
            .into_response(),
        Err(e) => read_error(&state, e),
    }
}

/// POST /interviews/:interview_id/report
/// Compile the report now, replacing any earlier one
pub async fn compile_report(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<IdentityQuery>,
) -> impl IntoResponse {
    let requested = requested_participant(&query);
    let result = match acting_identity(&headers, &query) {
        Ok(viewer) => {
            state
                .service
                .compile_report(&viewer, &interview_id, requested.as_ref())
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => read_error(&state, e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
