//! Cache key definitions.
//!
//! Every cache entry is addressed by a plain string. The layouts below are
//! shared by the read paths and the invalidation planner, so they must stay
//! byte-for-byte stable: a changed layout silently orphans live entries.

use std::fmt;

use crate::domain::items::{Limit, MinRating};

/// Key of the cached single-item payload.
pub fn point_key(name: &str) -> String {
    name.to_string()
}

/// `{secondaryTag}_limit_{limit}`
pub fn by_secondary_tag(secondary_tag: &str, limit: Limit) -> String {
    format!("{secondary_tag}_limit_{limit}")
}

/// `{primaryTag}_minRating_{minRating}_limit_{limit}`
///
/// The threshold renders as its shortest decimal form, so `0`, `0.1` and `5`
/// rather than `0.0` or `5.0`.
pub fn by_primary_tag(primary_tag: &str, min_rating: MinRating, limit: Limit) -> String {
    format!("{primary_tag}_minRating_{min_rating}_limit_{limit}")
}

/// `{secondaryTag}_{primaryTag}_limit_{limit}`
pub fn by_both_tags(secondary_tag: &str, primary_tag: &str, limit: Limit) -> String {
    format!("{secondary_tag}_{primary_tag}_limit_{limit}")
}

/// An indexed list query, as accepted by the directory read path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListQuery {
    BySecondaryTag {
        secondary_tag: String,
        limit: Limit,
    },
    ByPrimaryTag {
        primary_tag: String,
        min_rating: MinRating,
        limit: Limit,
    },
    ByBothTags {
        secondary_tag: String,
        primary_tag: String,
        limit: Limit,
    },
}

impl ListQuery {
    /// The cache key this query's result set lives under.
    pub fn cache_key(&self) -> String {
        match self {
            Self::BySecondaryTag {
                secondary_tag,
                limit,
            } => by_secondary_tag(secondary_tag, *limit),
            Self::ByPrimaryTag {
                primary_tag,
                min_rating,
                limit,
            } => by_primary_tag(primary_tag, *min_rating, *limit),
            Self::ByBothTags {
                secondary_tag,
                primary_tag,
                limit,
            } => by_both_tags(secondary_tag, primary_tag, *limit),
        }
    }

    pub fn limit(&self) -> Limit {
        match self {
            Self::BySecondaryTag { limit, .. }
            | Self::ByPrimaryTag { limit, .. }
            | Self::ByBothTags { limit, .. } => *limit,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BySecondaryTag { .. } => "by_secondary_tag",
            Self::ByPrimaryTag { .. } => "by_primary_tag",
            Self::ByBothTags { .. } => "by_both_tags",
        }
    }
}

impl fmt::Display for ListQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(value: u32) -> Limit {
        Limit::new(value).expect("valid limit")
    }

    fn min_rating(tenths: u8) -> MinRating {
        MinRating::from_tenths(tenths).expect("valid min rating")
    }

    #[test]
    fn point_key_is_the_name() {
        assert_eq!(point_key("Noodle Bar"), "Noodle Bar");
    }

    #[test]
    fn list_key_layouts() {
        assert_eq!(by_secondary_tag("Boston", limit(10)), "Boston_limit_10");
        assert_eq!(
            by_primary_tag("Thai", min_rating(0), limit(10)),
            "Thai_minRating_0_limit_10"
        );
        assert_eq!(
            by_primary_tag("Thai", min_rating(45), limit(100)),
            "Thai_minRating_4.5_limit_100"
        );
        assert_eq!(
            by_primary_tag("Thai", min_rating(50), limit(10)),
            "Thai_minRating_5_limit_10"
        );
        assert_eq!(
            by_both_tags("Boston", "Thai", limit(25)),
            "Boston_Thai_limit_25"
        );
    }

    #[test]
    fn list_query_derives_matching_key() {
        let query = ListQuery::ByPrimaryTag {
            primary_tag: "Thai".to_string(),
            min_rating: min_rating(3),
            limit: limit(10),
        };
        assert_eq!(query.cache_key(), "Thai_minRating_0.3_limit_10");
        assert_eq!(query.kind(), "by_primary_tag");
        assert_eq!(query.limit().get(), 10);

        let query = ListQuery::ByBothTags {
            secondary_tag: "Boston".to_string(),
            primary_tag: "Thai".to_string(),
            limit: limit(12),
        };
        assert_eq!(query.to_string(), "Boston_Thai_limit_12");
    }
}
