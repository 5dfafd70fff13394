use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use super::extract::ValidatedJson;
use crate::error::AppResult;
use crate::models::auth::Claims;
use crate::models::user::UpdateProfileRequest;
use crate::AppState;

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.profile.get(&claims).await?))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.profile.update(&claims, payload).await?))
}

pub async fn deactivate_profile(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.profile.deactivate(&claims).await?))
}
