//! Property-based tests for tag selection.
//!
//! These tests use proptest to verify selection invariants across many
//! randomly generated repositories.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use crate::{FilterRuleSet, PatternSet, RetentionPolicy, Tag, TagSelector};

const HOUR: u64 = 3600;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Strategy for generating tag names, with `latest` mixed in.
fn tag_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just("latest".to_string()),
        8 => "(v|release-|dev-|tmp-)[0-9]{1,3}(-rc)?",
    ]
}

/// Strategy for generating a repository: unique names, ages in hours.
fn repository_strategy() -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::btree_map(tag_name_strategy(), 0i64..2000, 0..30).prop_map(|tags| {
        tags.into_iter()
            .map(|(name, hours)| {
                Tag::new(name).with_created(now() - chrono::Duration::hours(hours))
            })
            .collect()
    })
}

/// Strategy for generating pattern lists.
fn patterns_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(
        prop::sample::select(vec!["^v", "^release-", "-rc$", "^tmp-", "dev", "1"]),
        0..3,
    )
}

fn rules(include: &[&str], exclude: &[&str]) -> FilterRuleSet {
    FilterRuleSet::new(
        PatternSet::compile(include).unwrap(),
        PatternSet::compile(exclude).unwrap(),
    )
}

fn age(tag: &Tag) -> Duration {
    now()
        .signed_duration_since(tag.created_at.unwrap())
        .to_std()
        .unwrap()
}

proptest! {
    #[test]
    fn latest_is_never_selected(
        tags in repository_strategy(),
        keep in 0usize..5,
    ) {
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(keep, Duration::ZERO);
        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        prop_assert!(result.to_delete.iter().all(|t| !t.is_latest()));
    }

    #[test]
    fn selected_tags_respect_patterns(
        tags in repository_strategy(),
        include in patterns_strategy(),
        exclude in patterns_strategy(),
        keep in 0usize..5,
    ) {
        let rules = rules(&include, &exclude);
        let policy = RetentionPolicy::new(keep, Duration::ZERO);
        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        for tag in &result.to_delete {
            prop_assert!(!rules.exclude.matches(&tag.name));
            if !include.is_empty() {
                prop_assert!(rules.include.matches(&tag.name));
            }
        }
    }

    #[test]
    fn keep_floor_retains_newest(
        tags in repository_strategy(),
        keep in 0usize..10,
    ) {
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(keep, Duration::ZERO);
        let matched = tags.iter().filter(|t| !t.is_latest()).count();
        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        if keep > 0 && matched <= keep {
            prop_assert!(result.to_delete.is_empty());
            prop_assert!(result.below_threshold);
        } else {
            prop_assert_eq!(result.to_delete.len(), matched - keep);
            prop_assert_eq!(result.retained.len(), keep);
            let oldest_kept = result.retained.iter().filter_map(|t| t.created_at).min();
            let newest_deleted = result.to_delete.iter().filter_map(|t| t.created_at).max();
            if let (Some(kept), Some(deleted)) = (oldest_kept, newest_deleted) {
                prop_assert!(kept >= deleted);
            }
        }
    }

    #[test]
    fn age_cutoff_is_respected(
        tags in repository_strategy(),
        keep in 0usize..5,
        max_age_hours in 1u64..2000,
    ) {
        let max_age = Duration::from_secs(max_age_hours * HOUR);
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(keep, max_age);
        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        for tag in &result.to_delete {
            prop_assert!(age(tag) > max_age);
        }
        if !result.below_threshold {
            for tag in result.retained.iter().skip(keep) {
                prop_assert!(age(tag) <= max_age);
            }
        }
    }

    #[test]
    fn deletion_order_is_newest_first(tags in repository_strategy()) {
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(0, Duration::ZERO);
        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        let times: Vec<_> = result.to_delete.iter().filter_map(|t| t.created_at).collect();
        prop_assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }
}
