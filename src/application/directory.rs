//! The cache-aside item directory.
//!
//! Reads go to the cache first and fall back to the durable store, populating
//! the cache on the way out. Writes go to the durable store and then purge
//! every list key the write could have made stale. Invalidation is best
//! effort: a failed purge is reported to the caller but never undoes the
//! durable write.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::application::error::DirectoryError;
use crate::application::repos::ItemsRepo;
use crate::cache::{
    CacheConfig, CacheError, CacheStore, InvalidationPlan, InvalidationSweep, ListQuery,
    payload, point_key,
};
use crate::domain::error::DomainError;
use crate::domain::items::{Item, NewItem, validate_rating};

const SOURCE: &str = "application::directory";
const METRIC_CACHE_HIT: &str = "itemdir_cache_hit_total";
const METRIC_CACHE_MISS: &str = "itemdir_cache_miss_total";

/// Cache handle plus the sweep bound to it; present only when caching is on.
struct CacheLayer {
    store: Arc<dyn CacheStore>,
    sweep: InvalidationSweep,
}

impl CacheLayer {
    async fn read_item(&self, name: &str) -> Result<Option<Item>, CacheError> {
        let key = point_key(name);
        let Some(raw) = self.store.get(&key).await? else {
            record_lookup(false, "point");
            return Ok(None);
        };
        match payload::decode_item(&raw) {
            Ok(item) => {
                record_lookup(true, "point");
                Ok(Some(item))
            }
            Err(err) => {
                self.discard_corrupt(&key, &err).await?;
                record_lookup(false, "point");
                Ok(None)
            }
        }
    }

    async fn write_item(&self, item: &Item) -> Result<(), CacheError> {
        let encoded = payload::encode_item(item)?;
        self.store.set(&point_key(&item.name), encoded).await
    }

    async fn read_list(&self, key: &str) -> Result<Option<Vec<Item>>, CacheError> {
        let Some(raw) = self.store.get(key).await? else {
            record_lookup(false, "list");
            return Ok(None);
        };
        match payload::decode_list(&raw) {
            Ok(items) => {
                record_lookup(true, "list");
                Ok(Some(items))
            }
            Err(err) => {
                self.discard_corrupt(key, &err).await?;
                record_lookup(false, "list");
                Ok(None)
            }
        }
    }

    async fn write_list(&self, key: &str, items: &[Item]) -> Result<(), CacheError> {
        let encoded = payload::encode_list(items)?;
        self.store.set(key, encoded).await
    }

    async fn purge_tags(&self, item: &Item) -> Result<(), CacheError> {
        let plan = InvalidationPlan::for_item(item);
        self.sweep.run(&plan).await.map(|_| ())
    }

    /// Unreadable entries are dropped and treated as misses.
    async fn discard_corrupt(&self, key: &str, err: &CacheError) -> Result<(), CacheError> {
        warn!(
            target = SOURCE,
            key = %key,
            error = %err,
            "Discarding undecodable cache entry"
        );
        self.store.delete(key).await
    }
}

fn record_lookup(hit: bool, kind: &'static str) {
    if hit {
        counter!(METRIC_CACHE_HIT, "kind" => kind).increment(1);
    } else {
        counter!(METRIC_CACHE_MISS, "kind" => kind).increment(1);
    }
}

fn require_name(name: &str) -> Result<&str, DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("`name` is required"));
    }
    Ok(name)
}

pub struct ItemDirectoryService {
    repo: Arc<dyn ItemsRepo>,
    cache: Option<CacheLayer>,
}

impl ItemDirectoryService {
    /// Builds the service. With `config.enabled == false` the cache store is
    /// never touched.
    pub fn new(repo: Arc<dyn ItemsRepo>, cache: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        let cache = config.enabled.then(|| CacheLayer {
            sweep: InvalidationSweep::new(Arc::clone(&cache), config.invalidation_concurrency),
            store: cache,
        });
        Self { repo, cache }
    }

    /// A service that reads and writes the durable store only.
    pub fn uncached(repo: Arc<dyn ItemsRepo>) -> Self {
        Self { repo, cache: None }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache_backend(&self) -> Option<&'static str> {
        self.cache.as_ref().map(|layer| layer.store.backend())
    }

    pub fn store_backend(&self) -> &'static str {
        self.repo.backend()
    }

    pub async fn health(&self) -> Result<(), DirectoryError> {
        Ok(self.repo.health_check().await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewItem) -> Result<Item, DirectoryError> {
        let item = input.into_item();

        let exists = match self.cache.as_ref() {
            Some(layer) => layer.read_item(&item.name).await?.is_some(),
            None => self.repo.get(&item.name).await?.is_some(),
        };
        if exists {
            return Err(DirectoryError::already_exists(&item.name));
        }

        if !self.repo.insert_if_absent(&item).await? {
            debug!(target = SOURCE, "Lost create race to a concurrent writer");
            return Err(DirectoryError::already_exists(&item.name));
        }

        if let Some(layer) = self.cache.as_ref() {
            let purged = layer.purge_tags(&item).await;
            layer.write_item(&item).await?;
            purged?;
        }

        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Item, DirectoryError> {
        let name = require_name(name)?;

        if let Some(layer) = self.cache.as_ref()
            && let Some(item) = layer.read_item(name).await?
        {
            debug!(target = SOURCE, "Served item from cache");
            return Ok(item);
        }

        let item = self
            .repo
            .get(name)
            .await?
            .ok_or_else(|| DirectoryError::not_found(name))?;

        if let Some(layer) = self.cache.as_ref() {
            layer.write_item(&item).await?;
        }

        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), DirectoryError> {
        let name = require_name(name)?;

        let item = self
            .repo
            .get(name)
            .await?
            .ok_or_else(|| DirectoryError::not_found(name))?;

        // Purge failures are held back so the durable delete still happens.
        let purged = match self.cache.as_ref() {
            Some(layer) => match layer.store.delete(&point_key(name)).await {
                Ok(()) => layer.purge_tags(&item).await,
                Err(err) => {
                    let _ = layer.purge_tags(&item).await;
                    Err(err)
                }
            },
            None => Ok(()),
        };

        self.repo.delete(name).await?;
        purged?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn rate(&self, name: &str, rating: f64) -> Result<Item, DirectoryError> {
        let name = require_name(name)?;
        let rating = validate_rating(rating)?;

        let current = self
            .repo
            .get(name)
            .await?
            .ok_or_else(|| DirectoryError::not_found(name))?;

        let updated = self
            .repo
            .apply_rating(name, rating)
            .await?
            .ok_or_else(|| DirectoryError::not_found(name))?;

        debug!(
            target = SOURCE,
            previous_rating = current.rating,
            previous_count = current.rating_count,
            rating = updated.rating,
            rating_count = updated.rating_count,
            "Applied rating"
        );

        if let Some(layer) = self.cache.as_ref() {
            let written = layer.write_item(&updated).await;
            let purged = layer.purge_tags(&updated).await;
            written?;
            purged?;
        }

        Ok(updated)
    }

    #[instrument(skip(self), fields(key = %query))]
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Item>, DirectoryError> {
        let key = query.cache_key();

        if let Some(layer) = self.cache.as_ref()
            && let Some(items) = layer.read_list(&key).await?
        {
            debug!(target = SOURCE, count = items.len(), "Served list from cache");
            return Ok(items);
        }

        let items = match query {
            ListQuery::BySecondaryTag {
                secondary_tag,
                limit,
            } => self.repo.query_by_secondary_tag(secondary_tag, *limit).await?,
            ListQuery::ByPrimaryTag {
                primary_tag,
                min_rating,
                limit,
            } => {
                self.repo
                    .query_by_primary_tag(primary_tag, *min_rating, *limit)
                    .await?
            }
            ListQuery::ByBothTags {
                secondary_tag,
                primary_tag,
                limit,
            } => {
                self.repo
                    .query_by_both_tags(secondary_tag, primary_tag, *limit)
                    .await?
            }
        };

        if let Some(layer) = self.cache.as_ref() {
            layer.write_list(&key, &items).await?;
        }

        Ok(items)
    }
}
