//! Serialized form of cached items.
//!
//! Cached records carry the rating as a string. Decoding accepts either a
//! string or a number and coerces to `f64`; anything unparseable reads as 0.

use serde::{Deserialize, Serialize};

use crate::domain::items::Item;

use super::error::CacheError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedItem {
    name: String,
    primary_tag: String,
    secondary_tag: String,
    rating: CachedRating,
    #[serde(default)]
    rating_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum CachedRating {
    Text(String),
    Number(f64),
}

impl CachedRating {
    fn coerce(&self) -> f64 {
        let value = match self {
            Self::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
            Self::Number(value) => *value,
        };
        if value.is_finite() { value } else { 0.0 }
    }
}

impl From<&Item> for CachedItem {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            primary_tag: item.primary_tag.clone(),
            secondary_tag: item.secondary_tag.clone(),
            rating: CachedRating::Text(item.rating.to_string()),
            rating_count: item.rating_count,
        }
    }
}

impl From<CachedItem> for Item {
    fn from(cached: CachedItem) -> Self {
        Item {
            rating: cached.rating.coerce(),
            name: cached.name,
            primary_tag: cached.primary_tag,
            secondary_tag: cached.secondary_tag,
            rating_count: cached.rating_count,
        }
    }
}

pub(crate) fn encode_item(item: &Item) -> Result<String, CacheError> {
    Ok(serde_json::to_string(&CachedItem::from(item))?)
}

pub(crate) fn decode_item(payload: &str) -> Result<Item, CacheError> {
    let cached: CachedItem = serde_json::from_str(payload)?;
    Ok(cached.into())
}

pub(crate) fn encode_list(items: &[Item]) -> Result<String, CacheError> {
    let cached: Vec<CachedItem> = items.iter().map(CachedItem::from).collect();
    Ok(serde_json::to_string(&cached)?)
}

pub(crate) fn decode_list(payload: &str) -> Result<Vec<Item>, CacheError> {
    let cached: Vec<CachedItem> = serde_json::from_str(payload)?;
    Ok(cached.into_iter().map(Item::from).collect())
}
