//! Runtime cache switch and sweep bound handed to the directory service.

use std::num::NonZeroUsize;

/// Default upper bound on in-flight deletes during an invalidation sweep.
pub const DEFAULT_INVALIDATION_CONCURRENCY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Global switch; when off the service never touches the cache.
    pub enabled: bool,
    /// Maximum in-flight deletes during an invalidation sweep.
    pub invalidation_concurrency: NonZeroUsize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            invalidation_concurrency: DEFAULT_INVALIDATION_CONCURRENCY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            invalidation_concurrency: settings.invalidation_concurrency,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
