use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use super::extract::{ApiPath, ValidatedJson};
use crate::error::AppResult;
use crate::models::category::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = state.categories.create(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.find_all().await?))
}

/// Categories without a parent
pub async fn list_root_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.find_roots().await?))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.find_one(id).await?))
}

pub async fn list_subcategories(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.find_subcategories(id).await?))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.update(id, payload).await?))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.remove(id).await?))
}
