use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::auth::Claims;
use crate::models::user::Role;
use crate::services::token_service::TokenIssuer;

/// Per-route role requirement, installed with `route_layer`.
#[derive(Clone)]
pub struct RoleGuard {
    tokens: Arc<TokenIssuer>,
    roles: Arc<[Role]>,
}

impl RoleGuard {
    pub fn new(tokens: Arc<TokenIssuer>, roles: &[Role]) -> Self {
        Self {
            tokens,
            roles: roles.into(),
        }
    }
}

/// Value of `Authorization: Bearer <token>`, if present and well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// No requirement allows anonymous access. With a requirement the bearer token
/// must verify and its role must be one of `required`.
pub fn authorize(
    tokens: &TokenIssuer,
    required: Option<&[Role]>,
    headers: &HeaderMap,
) -> AppResult<Option<Claims>> {
    let Some(required) = required else {
        return Ok(None);
    };

    let token = bearer_token(headers)
        .ok_or_else(|| AppError::unauthorized("Authorization token not provided"))?;
    let claims = tokens.verify(&token)?;

    if !required.contains(&claims.role) {
        tracing::warn!("role {} rejected for user {}", claims.role, claims.id);
        return Err(AppError::unauthorized("User role not authorized"));
    }
    Ok(Some(claims))
}

/// Role guard; on success the decoded claims are available to handlers as `Extension<Claims>`.
pub async fn guard(
    State(guard): State<RoleGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(claims) = authorize(&guard.tokens, Some(&guard.roles[..]), req.headers())? {
        req.extensions_mut().insert(claims);
    }
    Ok(next.run(req).await)
}
