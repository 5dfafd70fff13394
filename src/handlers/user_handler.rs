use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use super::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::error::AppResult;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserQuery};
use crate::AppState;

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let res = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): ApiQuery<UserQuery>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.users.find_all(query).await?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.users.find_one(id).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.users.update(id, payload).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.users.remove(id).await?))
}
