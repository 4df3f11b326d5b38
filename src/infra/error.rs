use thiserror::Error;

/// Failures of the process plumbing around the relation services.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("database url is not configured; set `database.url` or pass --database-url")]
    MissingDatabaseUrl,
    #[error("failed to connect to postgres: {message}")]
    Connect { message: String },
    #[error("migration failed: {message}")]
    Migration { message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("failed to write command output: {0}")]
    Output(#[from] std::io::Error),
}

impl InfraError {
    pub fn connect(err: impl std::fmt::Display) -> Self {
        Self::Connect {
            message: err.to_string(),
        }
    }

    pub fn migration(err: impl std::fmt::Display) -> Self {
        Self::Migration {
            message: err.to_string(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
