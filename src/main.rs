use anyhow::Context;
use chrono::Duration;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopfront_backend::{
    build_router,
    config::Config,
    repositories::{PgCategoryRepository, PgUserRepository, UserRepository},
    seed_default_admin,
    services::{mail_service::build_mailer, token_service::TokenIssuer},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. env and logging
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        "shopfront backend starting, mail provider {:?}, api prefix {:?}",
        config.mail.provider,
        config.api_prefix
    );

    // 2. database pool and migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to create database connection pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let user_store: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let category_store = Arc::new(PgCategoryRepository::new(pool));

    // 3. default admin
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        if seed_default_admin(user_store.as_ref(), email, password).await? {
            tracing::info!("default admin account created");
        }
    }

    let tokens = Arc::new(TokenIssuer::new(
        &config.jwt_secret,
        Duration::hours(config.jwt_expires_in_hours),
    ));
    let mailer = Arc::from(build_mailer(&config.mail).context("failed to build mailer")?);

    let shared_state = Arc::new(AppState::new(
        user_store,
        category_store,
        tokens,
        mailer,
        config.frontend_url.clone(),
    ));

    // 4. assemble and serve
    let app = build_router(shared_state, &config.api_prefix);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening at http://{}{}", addr, config.api_prefix);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
