use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::extract::ValidatedJson;
use crate::error::AppResult;
use crate::models::auth::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, ResetPasswordRequest, SignUpRequest,
};
use crate::AppState;

/// Registers a new account and signs the caller in
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<SignUpRequest>,
) -> AppResult<impl IntoResponse> {
    let res = state.auth.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Exchanges credentials for a bearer token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let res = state.auth.log_in(payload).await?;
    Ok((StatusCode::OK, Json(res)))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    state.auth.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new(
        "Password reset link has been sent to your email",
    )))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    state.auth.reset_password(payload).await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}
