use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::repos::RepoError, cache::CacheError, config::LoadError,
    domain::error::DomainError, infra::error::InfraError,
};

/// Failure details carried in response extensions for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Outcome taxonomy of directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("item `{name}` not found")]
    NotFound { name: String },
    #[error("item `{name}` already exists")]
    AlreadyExists { name: String },
    #[error("durable store unavailable")]
    Repo(#[source] RepoError),
    #[error("cache store unavailable")]
    Cache(#[source] CacheError),
}

impl DirectoryError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Whether a collaborator failed, as opposed to a client-visible outcome.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Repo(_) | Self::Cache(_))
    }
}

impl From<RepoError> for DirectoryError {
    fn from(error: RepoError) -> Self {
        Self::Repo(error)
    }
}

impl From<CacheError> for DirectoryError {
    fn from(error: CacheError) -> Self {
        Self::Cache(error)
    }
}

/// Process-level failure surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_collects_source_chain() {
        let error = DirectoryError::from(RepoError::Timeout);
        let report = ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &error);
        assert_eq!(
            report.messages,
            vec![
                "durable store unavailable".to_string(),
                "database timeout".to_string()
            ]
        );
    }

    #[test]
    fn store_failures_are_flagged() {
        assert!(DirectoryError::from(CacheError::backend("down")).is_store_unavailable());
        assert!(DirectoryError::from(RepoError::Timeout).is_store_unavailable());
        assert!(!DirectoryError::not_found("a").is_store_unavailable());
        assert!(
            !DirectoryError::from(DomainError::validation("bad")).is_store_unavailable()
        );
    }
}
