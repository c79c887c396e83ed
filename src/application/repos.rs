//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::items::{Item, Limit, MinRating};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable item storage keyed by name.
///
/// List queries return at most `limit` items ordered by rating, highest first.
#[async_trait]
pub trait ItemsRepo: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Item>, RepoError>;

    /// Upserts the full record.
    async fn put(&self, item: &Item) -> Result<(), RepoError>;

    /// Inserts `item` unless a record with the same name exists.
    ///
    /// Returns `false` when the name was already taken.
    async fn insert_if_absent(&self, item: &Item) -> Result<bool, RepoError>;

    /// Deleting an absent name is not an error.
    async fn delete(&self, name: &str) -> Result<(), RepoError>;

    /// Overwrites the rating aggregate. Fails with [`RepoError::NotFound`] if
    /// the item does not exist.
    async fn update_rating(
        &self,
        name: &str,
        rating: f64,
        rating_count: u32,
    ) -> Result<(), RepoError>;

    /// Folds `submitted` into the running average and increments the count
    /// in one atomic step. Returns `None` if the item does not exist.
    async fn apply_rating(&self, name: &str, submitted: f64) -> Result<Option<Item>, RepoError>;

    async fn query_by_secondary_tag(
        &self,
        secondary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError>;

    /// Only items rated at or above `min_rating` are returned.
    async fn query_by_primary_tag(
        &self,
        primary_tag: &str,
        min_rating: MinRating,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError>;

    async fn query_by_both_tags(
        &self,
        secondary_tag: &str,
        primary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;

    /// Backend label for logs and the runtime info endpoint.
    fn backend(&self) -> &'static str;
}
