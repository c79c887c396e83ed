use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("invalidation sweep failed for {failed} of {attempted} keys")]
    Sweep { failed: usize, attempted: usize },
}

impl CacheError {
    pub fn backend(err: impl Display) -> Self {
        Self::Backend(err.to_string())
    }
}
