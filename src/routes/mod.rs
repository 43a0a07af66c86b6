pub mod auth;
pub mod error;
pub mod health;
pub mod metrics;
pub mod session;
pub mod transcriptions;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::app_state::AppState;

/// Headroom for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build the API router. `/metrics` is mounted separately by the binary.
pub fn router(state: AppState) -> Router {
    let upload_limit = state
        .engine
        .settings()
        .max_file_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let transcriptions = Router::new()
        .route(
            "/api/v1/transcriptions",
            get(transcriptions::list_transcriptions),
        )
        .route(
            "/api/v1/transcriptions/image",
            post(transcriptions::submit_image),
        )
        .route(
            "/api/v1/transcriptions/audio",
            post(transcriptions::submit_audio),
        )
        .route(
            "/api/v1/transcriptions/{id}",
            get(transcriptions::get_transcription).delete(transcriptions::discard_transcription),
        )
        .route(
            "/api/v1/transcriptions/{id}/cancel",
            post(transcriptions::cancel_transcription),
        )
        .route(
            "/api/v1/transcriptions/{id}/events",
            get(transcriptions::stream_transcription),
        )
        .route(
            "/api/v1/transcriptions/{id}/export",
            get(transcriptions::export_transcription),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/session",
            get(session::current_session).delete(session::logout),
        )
        .route("/api/v1/session/login", post(session::login))
        .route("/api/v1/session/register", post(session::register))
        .route("/api/v1/session/provider", post(session::login_with_provider))
        .merge(transcriptions)
        .with_state(state)
}
