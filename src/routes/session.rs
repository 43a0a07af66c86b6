use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::session::{LoginRequest, RegisterRequest, SessionResponse, User};
use crate::routes::error::ApiError;

/// GET /api/v1/session: current session.
pub async fn current_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let user = state.session.current_user().await;
    Json(SessionResponse {
        is_authenticated: user.is_some(),
        user,
    })
}

/// POST /api/v1/session/login: email/password sign-in.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.session.login_with_email(&request).await?))
}

/// POST /api/v1/session/register: create an account and sign in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.session.register(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/session/provider: third-party sign-in.
pub async fn login_with_provider(State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    Ok(Json(state.session.login_with_provider().await?))
}

/// DELETE /api/v1/session: sign out.
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.session.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
