//! Application state - shared across all handlers.

use std::sync::Arc;

use todo_core::ports::{PasswordService, TodoRepository, TokenService, UserRepository};
use todo_infra::auth::{Argon2PasswordService, JwtTokenService};

#[cfg(any(test, not(feature = "postgres")))]
use todo_infra::auth::JwtConfig;
#[cfg(any(test, not(feature = "postgres")))]
use todo_infra::database::{InMemoryTodoRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use migration::{Migrator, MigratorTrait};
#[cfg(feature = "postgres")]
use todo_infra::database::{PostgresTodoRepository, PostgresUserRepository, connect};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub todos: Arc<dyn TodoRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub todos_require_auth: bool,
}

/// Reasons the server refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[cfg(feature = "postgres")]
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,

    #[cfg(feature = "postgres")]
    #[error("failed to connect to database: {0}")]
    Connect(String),

    #[cfg(feature = "postgres")]
    #[error("failed to apply migrations: {0}")]
    Migrate(String),
}

impl AppState {
    /// Connect to Postgres, apply migrations if enabled, and wire the repositories.
    #[cfg(feature = "postgres")]
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or(StartupError::MissingDatabaseUrl)?;

        let conn = connect(db_config)
            .await
            .map_err(|e| StartupError::Connect(e.to_string()))?;

        if config.run_migrations {
            Migrator::up(&conn, None)
                .await
                .map_err(|e| StartupError::Migrate(e.to_string()))?;
            tracing::info!("Database migrations applied");
        }

        tracing::info!(
            todos_require_auth = config.todos_require_auth,
            "Application state initialized"
        );

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            todos: Arc::new(PostgresTodoRepository::new(conn)),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            todos_require_auth: config.todos_require_auth,
        })
    }

    #[cfg(not(feature = "postgres"))]
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        tracing::warn!("Running without postgres feature - using in-memory repositories");
        if config.database.is_some() || config.run_migrations {
            tracing::warn!(
                run_migrations = config.run_migrations,
                "DATABASE_URL and RUN_MIGRATIONS are ignored without the postgres feature"
            );
        }
        Ok(Self::in_memory(config.jwt.clone(), config.todos_require_auth))
    }

    /// State backed by in-memory repositories.
    #[cfg(any(test, not(feature = "postgres")))]
    pub fn in_memory(jwt: JwtConfig, todos_require_auth: bool) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            todos: Arc::new(InMemoryTodoRepository::new()),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            todos_require_auth,
        }
    }
}
