//! Redis-backed cache store.

use std::num::NonZeroU64;

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::error::CacheError;
use super::store::CacheStore;

/// Shared cache backed by a Redis server.
///
/// `ConnectionManager` multiplexes and reconnects on its own, so every call
/// works on a cheap clone instead of holding a lock.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    ttl: Option<NonZeroU64>,
}

impl RedisCacheStore {
    pub async fn connect(url: &str, ttl: Option<NonZeroU64>) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::backend)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(CacheError::backend)?;

        info!(
            target = "itemdir::cache::redis",
            ttl_seconds = ttl.map(NonZeroU64::get),
            "Connected to redis cache"
        );

        Ok(Self { conn, ttl })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(CacheError::backend)
    }

    async fn set(&self, key: &str, payload: String) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(payload);
        if let Some(ttl) = self.ttl {
            cmd.arg("EX").arg(ttl.get());
        }
        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // DEL replies with the number of removed keys; zero is fine.
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await
            .map(|_| ())
            .map_err(CacheError::backend)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
