//! In-process item store, used when no database URL is configured.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::repos::{ItemsRepo, RepoError};
use crate::domain::items::{Item, Limit, MinRating};

#[derive(Default)]
pub struct InMemoryItemsRepo {
    items: RwLock<HashMap<String, Item>>,
}

impl InMemoryItemsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, limit: Limit, mut predicate: F) -> Vec<Item>
    where
        F: FnMut(&Item) -> bool,
    {
        let items = self.items.read().await;
        let mut selected: Vec<Item> = items.values().filter(|item| predicate(item)).cloned().collect();
        selected.sort_by(by_rating_desc);
        selected.truncate(limit.get() as usize);
        selected
    }
}

fn by_rating_desc(a: &Item, b: &Item) -> Ordering {
    b.rating
        .total_cmp(&a.rating)
        .then_with(|| a.name.cmp(&b.name))
}

#[async_trait]
impl ItemsRepo for InMemoryItemsRepo {
    async fn get(&self, name: &str) -> Result<Option<Item>, RepoError> {
        Ok(self.items.read().await.get(name).cloned())
    }

    async fn put(&self, item: &Item) -> Result<(), RepoError> {
        self.items
            .write()
            .await
            .insert(item.name.clone(), item.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, item: &Item) -> Result<bool, RepoError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.name) {
            return Ok(false);
        }
        items.insert(item.name.clone(), item.clone());
        Ok(true)
    }

    async fn delete(&self, name: &str) -> Result<(), RepoError> {
        self.items.write().await.remove(name);
        Ok(())
    }

    async fn update_rating(
        &self,
        name: &str,
        rating: f64,
        rating_count: u32,
    ) -> Result<(), RepoError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(name).ok_or(RepoError::NotFound)?;
        item.rating = rating;
        item.rating_count = rating_count;
        Ok(())
    }

    async fn apply_rating(&self, name: &str, submitted: f64) -> Result<Option<Item>, RepoError> {
        let mut items = self.items.write().await;
        let Some(item) = items.get_mut(name) else {
            return Ok(None);
        };
        *item = item.with_rating(submitted);
        Ok(Some(item.clone()))
    }

    async fn query_by_secondary_tag(
        &self,
        secondary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        Ok(self
            .select(limit, |item| item.secondary_tag == secondary_tag)
            .await)
    }

    async fn query_by_primary_tag(
        &self,
        primary_tag: &str,
        min_rating: MinRating,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        let threshold = min_rating.as_f64();
        Ok(self
            .select(limit, |item| {
                item.primary_tag == primary_tag && item.rating >= threshold
            })
            .await)
    }

    async fn query_by_both_tags(
        &self,
        secondary_tag: &str,
        primary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        Ok(self
            .select(limit, |item| {
                item.secondary_tag == secondary_tag && item.primary_tag == primary_tag
            })
            .await)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
