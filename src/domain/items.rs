//! Directory items and the validated query parameters that address them.
//!
//! `Limit` and `MinRating` are the only server-bounded dimensions of the list
//! key space. Both the read paths and the invalidation planner enumerate them
//! through the same types, so every key a read can produce is one the planner
//! knows how to purge.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub const MAX_RATING: f64 = 5.0;
pub const MIN_RATING: f64 = 0.0;

/// A directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub primary_tag: String,
    pub secondary_tag: String,
    pub rating: f64,
    pub rating_count: u32,
}

impl Item {
    /// A freshly created item carries no ratings.
    pub fn unrated(
        name: impl Into<String>,
        primary_tag: impl Into<String>,
        secondary_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_tag: primary_tag.into(),
            secondary_tag: secondary_tag.into(),
            rating: 0.0,
            rating_count: 0,
        }
    }

    /// Returns a copy with `submitted` folded into the running average.
    pub fn with_rating(&self, submitted: f64) -> Self {
        Self {
            rating: running_average(self.rating, self.rating_count, submitted),
            rating_count: self.rating_count.saturating_add(1),
            ..self.clone()
        }
    }
}

/// `(old * count + submitted) / (count + 1)`.
pub fn running_average(old: f64, count: u32, submitted: f64) -> f64 {
    let count = f64::from(count);
    (old * count + submitted) / (count + 1.0)
}

/// Validated input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub primary_tag: String,
    pub secondary_tag: String,
}

impl NewItem {
    pub fn new(
        name: Option<String>,
        primary_tag: Option<String>,
        secondary_tag: Option<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: required("name", name)?,
            primary_tag: required("primaryTag", primary_tag)?,
            secondary_tag: required("secondaryTag", secondary_tag)?,
        })
    }

    pub fn into_item(self) -> Item {
        Item::unrated(self.name, self.primary_tag, self.secondary_tag)
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, DomainError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DomainError::validation(format!("`{field}` is required"))),
    }
}

/// Validates a single submitted rating.
pub fn validate_rating(value: f64) -> Result<f64, DomainError> {
    if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(DomainError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
        )));
    }
    Ok(value)
}

/// Page size of an indexed query, always within `[Limit::MIN, Limit::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Limit(u32);

impl Limit {
    pub const MIN: u32 = 10;
    pub const MAX: u32 = 100;
    pub const DEFAULT: Limit = Limit(Self::MIN);

    pub fn new(value: u32) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "limit must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Every supported limit in ascending order.
    pub fn all() -> impl Iterator<Item = Limit> {
        (Self::MIN..=Self::MAX).map(Limit)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum-rating threshold of a primary-tag query, stored in tenths.
///
/// Thresholds live on the 0.1 grid between 0 and 5. Stepping is done on the
/// integer tenths so enumeration never accumulates floating-point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MinRating(u8);

impl MinRating {
    pub const MAX_TENTHS: u8 = 50;
    const GRID_TOLERANCE: f64 = 1e-6;

    pub fn from_tenths(tenths: u8) -> Result<Self, DomainError> {
        if tenths > Self::MAX_TENTHS {
            return Err(DomainError::validation(format!(
                "minRating must be between 0 and 5, got {}",
                f64::from(tenths) / 10.0
            )));
        }
        Ok(Self(tenths))
    }

    /// Quantizes `value` to the 0.1 grid, rejecting off-grid or out-of-range input.
    pub fn parse(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(DomainError::validation(format!(
                "minRating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            )));
        }
        let scaled = value * 10.0;
        let tenths = scaled.round();
        if (scaled - tenths).abs() > Self::GRID_TOLERANCE {
            return Err(DomainError::validation(format!(
                "minRating must be a multiple of 0.1, got {value}"
            )));
        }
        Self::from_tenths(tenths as u8)
    }

    pub fn tenths(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// All 51 thresholds from 0.0 to 5.0.
    pub fn all() -> impl Iterator<Item = MinRating> {
        (0..=Self::MAX_TENTHS).map(MinRating)
    }
}

impl fmt::Display for MinRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}
