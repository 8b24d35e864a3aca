/// Blog Service - Main entry point
/// Serves the registration, login, profile and user administration REST API
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use blog_service::config::Settings;
use blog_service::db::PgUserRepository;
use blog_service::security::{PasswordHasher, RedisRevocationStore};
use blog_service::{metrics, telemetry, AppState};
use crypto_core::jwt::JwtKeys;
use db_pool::create_pool;
use redis_utils::RedisPool;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration from environment")?;
    telemetry::init_tracing()?;

    tracing::info!(
        "Starting blog-service v{} on {}",
        env!("CARGO_PKG_VERSION"),
        settings.server.bind_address()
    );

    metrics::initialize_metrics();

    // Database
    settings.database.log_config();
    let db_pool = create_pool(settings.database.clone())
        .await
        .context("Failed to create database pool")?;
    tracing::info!("Database connection pool initialized");

    // Redis (revocation store)
    let redis_pool = RedisPool::connect(&settings.redis.url).await?;
    if let Err(e) = redis_pool.ping(settings.redis.command_timeout).await {
        tracing::warn!(
            error = %e,
            policy = ?settings.security.revocation_failure_policy,
            "Redis not answering at startup; revocation checks follow the failure policy"
        );
    }

    let jwt = JwtKeys::new(&settings.jwt.secret, settings.jwt.ttl())
        .context("Failed to initialize JWT keys")?;
    let hasher = PasswordHasher::from_settings(&settings.security)
        .context("Invalid Argon2 settings")?;

    let state = AppState::new(
        Arc::new(PgUserRepository::new(db_pool)),
        Arc::new(RedisRevocationStore::new(
            redis_pool.manager(),
            settings.redis.command_timeout,
        )),
        hasher,
        jwt,
        settings.roles.clone(),
        settings.security.revocation_failure_policy,
    );

    tracing::info!(
        admin_role = %settings.roles.admin,
        writer_role = %settings.roles.writer,
        "Roles configured"
    );

    let bind_address = settings.server.bind_address();
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .workers(settings.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("blog-service stopped");
    Ok(())
}
