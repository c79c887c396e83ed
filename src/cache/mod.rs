//! Cache-aside support for the item directory.
//!
//! - **Keys**: canonical strings for point lookups and indexed list queries
//! - **Planner**: the complete set of list keys a write can make stale
//! - **Sweep**: bounded concurrent purge of a plan
//! - **Stores**: in-process LRU and Redis implementations of [`CacheStore`]
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"          # or "redis"
//! memory_capacity = 10000
//! invalidation_concurrency = 64
//! ```

mod config;
mod error;
mod keys;
mod lock;
pub(crate) mod payload;
mod planner;
mod redis;
mod store;
mod sweep;

pub use config::{CacheConfig, DEFAULT_INVALIDATION_CONCURRENCY};
pub use error::CacheError;
pub use keys::{ListQuery, by_both_tags, by_primary_tag, by_secondary_tag, point_key};
pub use planner::InvalidationPlan;
pub use self::redis::RedisCacheStore;
pub use store::{CacheStore, LruCacheStore};
pub use sweep::{InvalidationSweep, SweepReport};
