//! Bootstrap failures: anything that stops the process before it can serve.

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to connect to the durable store")]
    Database(#[from] sqlx::Error),
    #[error("failed to apply migrations")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to connect to the cache store")]
    Cache(#[from] CacheError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
