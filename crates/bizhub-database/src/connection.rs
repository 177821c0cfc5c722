//! PostgreSQL pool shared by the account, access, session and audit repositories.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use bizhub_core::config::database::DatabaseConfig;
use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;

/// Reported to the server as `application_name`.
const APPLICATION_NAME: &str = "bizhub";

/// Shared connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Opens the pool described by `config`.
    ///
    /// A malformed URL is a configuration error. An unreachable server is a
    /// database error.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = connect_options(config)?;
        info!(
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or("<default>"),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to connect to PostgreSQL", e)
            })?;

        info!("PostgreSQL pool ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// One `SELECT 1` round trip, used by the health endpoint.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database ping failed", e))
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

fn connect_options(config: &DatabaseConfig) -> AppResult<PgConnectOptions> {
    PgConnectOptions::from_str(&config.url)
        .map(|options| options.application_name(APPLICATION_NAME))
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                "database.url is not a valid PostgreSQL URL",
                e,
            )
        })
}
