//! Tag selection: decides which tags of a repository are deleted.
//!
//! Selection runs in a fixed order:
//!
//! 1. `latest`, excluded and non-included tags are dropped.
//! 2. If the keep floor covers every remaining tag, nothing is selected and
//!    creation times are not needed.
//! 3. Remaining tags are ranked newest first (stable on equal timestamps).
//! 4. The newest `keep_newest` tags are retained.
//! 5. With a maximum age, only candidates strictly older than it are selected.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::policy::{FilterRuleSet, RetentionPolicy};
use crate::tag::Tag;

/// Tags left after pattern filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Tags that passed every filter, in input order.
    pub matched: Vec<Tag>,

    /// Number of tags dropped by filtering.
    pub skipped: usize,
}

/// The decision for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    /// Tags to delete, newest first.
    pub to_delete: Vec<Tag>,

    /// Matched tags that survive, newest first once ranked.
    pub retained: Vec<Tag>,

    /// Number of tags that passed filtering.
    pub matched: usize,

    /// Number of tags dropped by filtering.
    pub skipped: usize,

    /// True when the keep floor covered every matched tag and ranking was skipped.
    pub below_threshold: bool,
}

impl SelectionResult {
    /// Returns true if nothing is to be deleted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
    }

    /// Returns the names of the tags to delete.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.to_delete.iter().map(|tag| tag.name.as_str())
    }
}

/// Applies filter rules and a retention policy to a repository's tags.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use regprune_core::{FilterRuleSet, RetentionPolicy, Tag, TagSelector};
///
/// let now = Utc::now();
/// let tags = vec![
///     Tag::new("v1").with_created(now - Duration::days(40)),
///     Tag::new("v2").with_created(now - Duration::days(20)),
///     Tag::new("v3").with_created(now - Duration::days(5)),
///     Tag::new("latest").with_created(now),
/// ];
///
/// let rules = FilterRuleSet::default();
/// let policy = RetentionPolicy::new(1, std::time::Duration::from_secs(30 * 24 * 3600));
/// let result = TagSelector::new(&rules, &policy).select(tags, now).unwrap();
///
/// assert_eq!(result.names().collect::<Vec<_>>(), vec!["v1"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TagSelector<'a> {
    rules: &'a FilterRuleSet,
    policy: &'a RetentionPolicy,
}

impl<'a> TagSelector<'a> {
    /// Creates a selector for the given rules and policy.
    #[must_use]
    pub const fn new(rules: &'a FilterRuleSet, policy: &'a RetentionPolicy) -> Self {
        Self { rules, policy }
    }

    /// Drops `latest`, excluded and non-included tags.
    pub fn filter(&self, tags: impl IntoIterator<Item = Tag>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for tag in tags {
            if let Some(reason) = self.rules.skip_reason(&tag.name) {
                debug!(tag = %tag.name, %reason, "Skipped tag");
                outcome.skipped += 1;
            } else {
                debug!(tag = %tag.name, "Matched tag");
                outcome.matched.push(tag);
            }
        }

        outcome
    }

    /// Returns true if the filtered tags are all covered by the keep floor,
    /// in which case creation times never need to be fetched.
    #[must_use]
    pub fn is_below_threshold(&self, filtered: &FilterOutcome) -> bool {
        self.policy.is_below_threshold(filtered.matched.len())
    }

    /// Runs the whole selection over raw tags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCreationTime`] if ranking is required and a
    /// matched tag has no creation time.
    pub fn select(
        &self,
        tags: impl IntoIterator<Item = Tag>,
        now: DateTime<Utc>,
    ) -> Result<SelectionResult> {
        self.select_filtered(self.filter(tags), now)
    }

    /// Ranks already filtered tags and applies the retention policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCreationTime`] if ranking is required and a
    /// matched tag has no creation time.
    pub fn select_filtered(
        &self,
        filtered: FilterOutcome,
        now: DateTime<Utc>,
    ) -> Result<SelectionResult> {
        let FilterOutcome { matched, skipped } = filtered;
        let matched_count = matched.len();

        if self.policy.is_below_threshold(matched_count) {
            return Ok(SelectionResult {
                to_delete: Vec::new(),
                retained: matched,
                matched: matched_count,
                skipped,
                below_threshold: true,
            });
        }

        let mut ranked = matched
            .into_iter()
            .map(|tag| match tag.created_at {
                Some(created_at) => Ok((created_at, tag)),
                None => Err(Error::MissingCreationTime { tag: tag.name }),
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable sort: tags with identical timestamps keep registry order.
        ranked.sort_by(|(a, _), (b, _)| b.cmp(a));

        let floor = self.policy.keep_newest.min(ranked.len());
        let candidates = ranked.split_off(floor);
        let mut retained: Vec<Tag> = ranked.into_iter().map(|(_, tag)| tag).collect();
        let mut to_delete = Vec::with_capacity(candidates.len());

        for (created_at, tag) in candidates {
            match self.policy.max_age {
                Some(max_age) if !is_older_than(created_at, now, max_age) => {
                    debug!(
                        tag = %tag.name,
                        age = %now.signed_duration_since(created_at),
                        "Tag kept because it is not old enough"
                    );
                    retained.push(tag);
                }
                _ => to_delete.push(tag),
            }
        }

        Ok(SelectionResult {
            to_delete,
            retained,
            matched: matched_count,
            skipped,
            below_threshold: false,
        })
    }
}

/// Returns true if `now - created_at` is strictly greater than `max_age`.
/// Timestamps in the future are never older.
#[must_use]
pub fn is_older_than(created_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(created_at)
        .to_std()
        .is_ok_and(|age| age > max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternSet;
    use chrono::TimeZone;

    const DAY: u64 = 24 * 60 * 60;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn aged(name: &str, days: i64) -> Tag {
        Tag::new(name).with_created(now() - chrono::Duration::days(days))
    }

    fn rules(include: &[&str], exclude: &[&str]) -> FilterRuleSet {
        FilterRuleSet::new(
            PatternSet::compile(include).unwrap(),
            PatternSet::compile(exclude).unwrap(),
        )
    }

    fn names(result: &SelectionResult) -> Vec<&str> {
        result.names().collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let tags = vec![aged("v1", 40), aged("v2", 20), aged("v3", 5), aged("latest", 0)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(1, Duration::from_secs(30 * DAY));

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(names(&result), vec!["v1"]);
        assert_eq!(result.matched, 3);
        assert_eq!(result.skipped, 1);
        assert!(!result.below_threshold);
        let retained: Vec<_> = result.retained.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(retained, vec!["v3", "v2"]);
    }

    #[test]
    fn test_below_threshold_needs_no_creation_time() {
        let tags = vec![Tag::new("a"), Tag::new("b"), Tag::new("latest")];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(2, Duration::ZERO);

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert!(result.is_empty());
        assert!(result.below_threshold);
        assert_eq!(result.retained.len(), 2);
    }

    #[test]
    fn test_missing_creation_time() {
        let tags = vec![aged("a", 1), Tag::new("b")];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(1, Duration::ZERO);

        let err = TagSelector::new(&rules, &policy).select(tags, now()).unwrap_err();
        assert!(matches!(err, Error::MissingCreationTime { ref tag } if tag == "b"));
    }

    #[test]
    fn test_no_floor_no_age_deletes_all_matched() {
        let tags = vec![aged("a", 3), aged("b", 1), aged("c", 2), aged("latest", 9)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(0, Duration::ZERO);

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(names(&result), vec!["b", "c", "a"]);
        assert!(result.retained.is_empty());
    }

    #[test]
    fn test_age_cutoff_is_strict() {
        let tags = vec![aged("exact", 10), aged("older", 11), aged("newer", 9)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(0, Duration::from_secs(10 * DAY));

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(names(&result), vec!["older"]);
    }

    #[test]
    fn test_future_timestamp_is_retained() {
        let tags = vec![aged("future", -3)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(0, Duration::from_secs(DAY));

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.retained.len(), 1);
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let tags = vec![
            aged("v1.0", 30),
            aged("v1.1-rc", 25),
            aged("feature-x", 20),
            aged("v1.2", 10),
        ];
        let rules = rules(&["^v"], &["-rc$"]);
        let policy = RetentionPolicy::new(0, Duration::ZERO);

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(names(&result), vec!["v1.2", "v1.0"]);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let tags = vec![aged("first", 5), aged("second", 5), aged("third", 5)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(1, Duration::ZERO);

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(result.retained[0].name, "first");
        assert_eq!(names(&result), vec!["second", "third"]);
    }

    #[test]
    fn test_keep_floor_retains_newest() {
        let tags = vec![aged("a", 1), aged("b", 2), aged("c", 3), aged("d", 4)];
        let rules = FilterRuleSet::default();
        let policy = RetentionPolicy::new(2, Duration::ZERO);

        let result = TagSelector::new(&rules, &policy).select(tags, now()).unwrap();

        assert_eq!(names(&result), vec!["c", "d"]);
    }

    #[test]
    fn test_is_older_than() {
        let max_age = Duration::from_secs(DAY);
        assert!(is_older_than(now() - chrono::Duration::days(2), now(), max_age));
        assert!(!is_older_than(now() - chrono::Duration::days(1), now(), max_age));
        assert!(!is_older_than(now() + chrono::Duration::days(1), now(), max_age));
    }

    #[test]
    fn test_filter_counts() {
        let rules = rules(&[], &["^tmp"]);
        let policy = RetentionPolicy::default();
        let selector = TagSelector::new(&rules, &policy);

        let outcome = selector.filter(vec![Tag::new("tmp-1"), Tag::new("v1"), Tag::new("latest")]);

        assert_eq!(outcome.matched, vec![Tag::new("v1")]);
        assert_eq!(outcome.skipped, 2);
    }
}
