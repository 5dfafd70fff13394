use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

use handlers::{auth_handler, category_handler, health_handler, profile_handler, user_handler};
use middleware::auth::{guard, RoleGuard};
use error::AppResult;
use models::user::{normalize_email, NewUser, Role};
use repositories::{CategoryRepository, UserRepository};
use services::{
    auth_service::AuthService, category_service::CategoryService, mail_service::Mailer,
    password::hash_password, profile_service::ProfileService, token_service::TokenIssuer,
    user_service::UserService,
};

// Shared handler state
pub struct AppState {
    pub user_store: Arc<dyn UserRepository>,
    pub tokens: Arc<TokenIssuer>,
    pub auth: AuthService,
    pub users: UserService,
    pub profile: ProfileService,
    pub categories: CategoryService,
}

impl AppState {
    pub fn new(
        user_store: Arc<dyn UserRepository>,
        category_store: Arc<dyn CategoryRepository>,
        tokens: Arc<TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        Self {
            auth: AuthService::new(user_store.clone(), tokens.clone(), mailer, frontend_url),
            users: UserService::new(user_store.clone()),
            profile: ProfileService::new(user_store.clone()),
            categories: CategoryService::new(category_store),
            user_store,
            tokens,
        }
    }
}

/// Creates the admin account on first start. Returns `true` when a user was inserted.
pub async fn seed_default_admin(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> AppResult<bool> {
    let email = normalize_email(email);
    if users.find_by_email(&email).await?.is_some() {
        return Ok(false);
    }

    tracing::info!("no account for {}, creating default admin", email);
    let password_hash = hash_password(password)?;
    users
        .create(NewUser::basic("admin".into(), email, password_hash, Role::Admin))
        .await?;
    Ok(true)
}

/// Builds the full HTTP application. `api_prefix` is either empty or starts with `/`.
pub fn build_router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let admin_only = from_fn_with_state(
        RoleGuard::new(state.tokens.clone(), &[Role::Admin]),
        guard,
    );
    let signed_in = from_fn_with_state(
        RoleGuard::new(state.tokens.clone(), &[Role::User, Role::Admin]),
        guard,
    );

    let public_routes = Router::new()
        .route("/health", get(health_handler::health_check))
        .route("/auth/signup", post(auth_handler::signup))
        .route("/auth/login", post(auth_handler::login))
        .route("/auth/forgot-password", post(auth_handler::forgot_password))
        .route("/auth/reset-password", post(auth_handler::reset_password))
        .route("/categories", get(category_handler::list_categories))
        .route("/categories/roots", get(category_handler::list_root_categories))
        .route("/categories/:id", get(category_handler::get_category))
        .route(
            "/categories/:id/subcategories",
            get(category_handler::list_subcategories),
        );

    let profile_routes = Router::new()
        .route("/profile", get(profile_handler::get_profile))
        .route("/profile/update", patch(profile_handler::update_profile))
        .route("/profile/deactive", patch(profile_handler::deactivate_profile))
        .route_layer(signed_in);

    let admin_routes = Router::new()
        .route(
            "/users",
            post(user_handler::create_user).get(user_handler::list_users),
        )
        .route(
            "/users/:id",
            get(user_handler::get_user)
                .patch(user_handler::update_user)
                .delete(user_handler::delete_user),
        )
        .route("/categories", post(category_handler::create_category))
        .route(
            "/categories/:id",
            patch(category_handler::update_category).delete(category_handler::delete_category),
        )
        .route_layer(admin_only);

    let api = Router::new()
        .merge(public_routes)
        .merge(profile_routes)
        .merge(admin_routes);

    let app = if api_prefix.is_empty() {
        api
    } else {
        Router::new().nest(api_prefix, api)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
