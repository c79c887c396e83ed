//! Invalidation plan generation.
//!
//! A write to an item can change the membership or ordering of any list that
//! filters on its primary or secondary tag. Those lists are addressed by keys
//! that embed the query parameters, so the planner enumerates every supported
//! parameter value instead of tracking which keys were actually populated.

use std::collections::HashSet;
use std::fmt;

use crate::domain::items::{Item, Limit, MinRating};

use super::keys::{by_both_tags, by_primary_tag, by_secondary_tag};

const LIMIT_STEPS: usize = (Limit::MAX - Limit::MIN + 1) as usize;
const MIN_RATING_STEPS: usize = MinRating::MAX_TENTHS as usize + 1;

/// The set of list keys to purge after a write touching one tag pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    primary_tag: String,
    secondary_tag: String,
    keys: HashSet<String>,
}

impl InvalidationPlan {
    /// Keys produced for a tag pair: per limit, one secondary-tag key, one
    /// both-tags key and one primary-tag key per threshold.
    pub const KEYS_PER_PAIR: usize = LIMIT_STEPS * (2 + MIN_RATING_STEPS);

    pub fn for_tags(primary_tag: &str, secondary_tag: &str) -> Self {
        let mut keys = HashSet::with_capacity(Self::KEYS_PER_PAIR);
        for limit in Limit::all() {
            keys.insert(by_secondary_tag(secondary_tag, limit));
            keys.insert(by_both_tags(secondary_tag, primary_tag, limit));
            for min_rating in MinRating::all() {
                keys.insert(by_primary_tag(primary_tag, min_rating, limit));
            }
        }

        Self {
            primary_tag: primary_tag.to_string(),
            secondary_tag: secondary_tag.to_string(),
            keys,
        }
    }

    pub fn for_item(item: &Item) -> Self {
        Self::for_tags(&item.primary_tag, &item.secondary_tag)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ primary_tag: {}, secondary_tag: {}, keys: {} }}",
            self.primary_tag,
            self.secondary_tag,
            self.keys.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::{ListQuery, point_key};

    #[test]
    fn plan_has_expected_cardinality() {
        assert_eq!(InvalidationPlan::KEYS_PER_PAIR, 4823);

        let plan = InvalidationPlan::for_tags("Thai", "Boston");
        assert_eq!(plan.len(), 4823);
        assert!(!plan.is_empty());
    }

    #[test]
    fn plan_covers_boundary_keys() {
        let plan = InvalidationPlan::for_tags("Thai", "Boston");

        for key in [
            "Boston_limit_10",
            "Boston_limit_100",
            "Boston_Thai_limit_10",
            "Boston_Thai_limit_100",
            "Thai_minRating_0_limit_10",
            "Thai_minRating_0.1_limit_10",
            "Thai_minRating_4.9_limit_57",
            "Thai_minRating_5_limit_100",
        ] {
            assert!(plan.contains(key), "missing {key}");
        }

        assert!(!plan.contains("Boston_limit_9"));
        assert!(!plan.contains("Boston_limit_101"));
        assert!(!plan.contains("Thai_minRating_5.1_limit_10"));
    }

    #[test]
    fn plan_excludes_point_key_and_other_tags() {
        let plan = InvalidationPlan::for_tags("Thai", "Boston");
        assert!(!plan.contains(&point_key("Noodle Bar")));
        assert!(!plan.contains("Cambridge_limit_10"));
        assert!(!plan.contains("Italian_minRating_0_limit_10"));
    }

    #[test]
    fn plan_covers_every_readable_list_key() {
        let plan = InvalidationPlan::for_tags("Thai", "Boston");
        for limit in Limit::all() {
            for min_rating in MinRating::all() {
                let query = ListQuery::ByPrimaryTag {
                    primary_tag: "Thai".to_string(),
                    min_rating,
                    limit,
                };
                assert!(plan.contains(&query.cache_key()));
            }
            let query = ListQuery::BySecondaryTag {
                secondary_tag: "Boston".to_string(),
                limit,
            };
            assert!(plan.contains(&query.cache_key()));
        }
    }

    #[test]
    fn plan_is_deterministic() {
        let first = InvalidationPlan::for_tags("Thai", "Boston");
        let second = InvalidationPlan::for_item(&Item::unrated("Noodle Bar", "Thai", "Boston"));
        assert_eq!(first, second);

        let mut first_keys: Vec<&str> = first.iter().collect();
        let mut second_keys: Vec<&str> = second.iter().collect();
        first_keys.sort_unstable();
        second_keys.sort_unstable();
        assert_eq!(first_keys, second_keys);
    }

    #[test]
    fn display_summarizes_plan() {
        let plan = InvalidationPlan::for_tags("Thai", "Boston");
        assert_eq!(
            plan.to_string(),
            "InvalidationPlan { primary_tag: Thai, secondary_tag: Boston, keys: 4823 }"
        );
    }
}
