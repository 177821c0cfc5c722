//! BizHub Server: multitenant business backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use bizhub_api::AppState;
use bizhub_auth::{
    AccessAdmin, Argon2PasswordHasher, AuditRecorder, AuthGateway, CacheRateLimiter,
    MemoryRateLimiter, PermissionResolver, RateLimiter, RevocationStore, SessionCleanup,
    SessionRegistry, TokenCodec,
};
use bizhub_cache::CacheManager;
use bizhub_core::config::AppConfig;
use bizhub_core::error::AppError;
use bizhub_core::traits::{Clock, SystemClock};
use bizhub_database::{
    AccessRepository, AccountRepository, AuditLogRepository, DatabasePool, SessionRepository,
};

#[tokio::main]
async fn main() {
    let env = std::env::var("BIZHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BizHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        bizhub_database::migration::run_migrations(database.pool()).await?;
    }

    // ── Step 2: Cache ────────────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 3: Repositories ─────────────────────────────────────
    let pool = database.pool().clone();
    let accounts = Arc::new(AccountRepository::new(pool.clone()));
    let access = Arc::new(AccessRepository::new(pool.clone()));
    let sessions = Arc::new(SessionRepository::new(pool.clone()));
    let audit_log = Arc::new(AuditLogRepository::new(pool));

    // ── Step 4: Auth core ────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(TokenCodec::new(&config.auth.jwt_secret, clock.clone()));
    let revocations = Arc::new(RevocationStore::new(cache.clone(), clock.clone()));
    let registry = Arc::new(SessionRegistry::new(sessions, clock.clone()));
    let resolver = Arc::new(PermissionResolver::new(accounts.clone(), access.clone()));
    let recorder = Arc::new(AuditRecorder::new(
        audit_log.clone(),
        config.auth.audit_timeout(),
    ));

    // Redis-backed deployments share login counters between nodes.
    let rate_limiter: Arc<dyn RateLimiter> = match config.cache.provider.as_str() {
        "redis" => Arc::new(CacheRateLimiter::new(cache.clone(), clock.clone(), "login")),
        _ => Arc::new(MemoryRateLimiter::new(
            clock.clone(),
            config.auth.login_rate_limit.sweep_interval(),
        )),
    };

    let gateway = Arc::new(AuthGateway::new(
        codec,
        revocations,
        registry.clone(),
        resolver,
        accounts.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        rate_limiter,
        recorder.clone(),
        &config.auth,
    ));
    let admin = Arc::new(AccessAdmin::new(
        gateway.clone(),
        accounts,
        access,
        recorder,
    ));

    // ── Step 5: Background session sweep ─────────────────────────
    let cleanup_handle = match config.session.cleanup_interval_minutes {
        0 => {
            tracing::info!("Expired session sweep disabled");
            None
        }
        minutes => Some(
            SessionCleanup::new(registry).spawn(Duration::from_secs(minutes * 60)),
        ),
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let state = AppState {
        server: Arc::new(config.server.clone()),
        database: Some(database.clone()),
        cache,
        gateway,
        admin,
        audit_log,
    };
    let app = bizhub_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "BizHub server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Stop background tasks ────────────────────────────
    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    database.close().await;

    tracing::info!("BizHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
