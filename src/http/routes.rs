use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest recording accepted for one turn
const MAX_RECORDING_BYTES: usize = 25 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interviews
        .route(
            "/interviews",
            get(handlers::list_interviews).post(handlers::create_solo),
        )
        .route("/interviews/enterprise", post(handlers::create_enterprise))
        .route(
            "/interviews/:interview_id/participant",
            get(handlers::participant_info),
        )
        // Live session
        .route(
            "/interviews/:interview_id/session",
            get(handlers::get_session_status),
        )
        .route(
            "/interviews/:interview_id/session/start",
            post(handlers::start_session),
        )
        .route(
            "/interviews/:interview_id/session/turn",
            post(handlers::submit_turn).layer(DefaultBodyLimit::max(MAX_RECORDING_BYTES)),
        )
        .route(
            "/interviews/:interview_id/session/playback-ended",
            post(handlers::playback_ended),
        )
        .route(
            "/interviews/:interview_id/session/finish",
            post(handlers::finish_session),
        )
        .route(
            "/interviews/:interview_id/session/transcript",
            get(handlers::get_transcript),
        )
        // Reports
        .route(
            "/interviews/:interview_id/report",
            get(handlers::get_report).post(handlers::compile_report),
        )
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
