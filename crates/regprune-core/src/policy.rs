//! Filter rules and retention policy.

use std::time::Duration;

use crate::pattern::PatternSet;

/// Include and exclude patterns applied to tag names.
#[derive(Debug, Clone, Default)]
pub struct FilterRuleSet {
    /// Tags must match one of these to be considered. Empty means all tags.
    pub include: PatternSet,

    /// Tags matching any of these are never considered.
    pub exclude: PatternSet,
}

impl FilterRuleSet {
    /// Creates a rule set from compiled include and exclude patterns.
    #[must_use]
    pub const fn new(include: PatternSet, exclude: PatternSet) -> Self {
        Self { include, exclude }
    }

    /// Returns why `name` is skipped, or `None` if it is a deletion candidate.
    ///
    /// The `latest` tag is always skipped.
    #[must_use]
    pub fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        if name == crate::tag::LATEST_TAG {
            Some(SkipReason::Latest)
        } else if self.exclude.matches(name) {
            Some(SkipReason::Excluded)
        } else if !self.include.is_empty() && !self.include.matches(name) {
            Some(SkipReason::NotIncluded)
        } else {
            None
        }
    }
}

/// Why a tag was dropped during filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The tag is `latest`.
    Latest,
    /// The tag matched an exclude pattern.
    Excluded,
    /// Include patterns are set and the tag matched none of them.
    NotIncluded,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest tag"),
            Self::Excluded => write!(f, "exclude rule"),
            Self::NotIncluded => write!(f, "no include rule matched"),
        }
    }
}

/// How many tags to keep and how old a tag must be to be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    /// Number of newest matching tags that are always kept. Zero disables the floor.
    pub keep_newest: usize,

    /// Only tags older than this are deleted. `None` deletes every tag past the floor.
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    /// Creates a policy. A zero `max_age` is treated as no age cutoff.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use regprune_core::RetentionPolicy;
    ///
    /// let policy = RetentionPolicy::new(5, Duration::ZERO);
    /// assert_eq!(policy.max_age, None);
    /// ```
    #[must_use]
    pub fn new(keep_newest: usize, max_age: Duration) -> Self {
        Self {
            keep_newest,
            max_age: (!max_age.is_zero()).then_some(max_age),
        }
    }

    /// Returns true if `matched` tags are all protected by the keep floor.
    #[must_use]
    pub const fn is_below_threshold(&self, matched: usize) -> bool {
        self.keep_newest > 0 && matched <= self.keep_newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(include: &[&str], exclude: &[&str]) -> FilterRuleSet {
        FilterRuleSet::new(
            PatternSet::compile(include).unwrap(),
            PatternSet::compile(exclude).unwrap(),
        )
    }

    #[test]
    fn test_latest_always_skipped() {
        let rules = rules(&["latest"], &[]);
        assert_eq!(rules.skip_reason("latest"), Some(SkipReason::Latest));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let rules = rules(&["^v"], &["-rc"]);
        assert_eq!(rules.skip_reason("v1-rc"), Some(SkipReason::Excluded));
        assert_eq!(rules.skip_reason("v1"), None);
    }

    #[test]
    fn test_empty_include_matches_all() {
        let rules = rules(&[], &[]);
        assert_eq!(rules.skip_reason("anything"), None);
    }

    #[test]
    fn test_not_included() {
        let rules = rules(&["^v"], &[]);
        assert_eq!(rules.skip_reason("main"), Some(SkipReason::NotIncluded));
    }

    #[test]
    fn test_below_threshold() {
        let policy = RetentionPolicy::new(3, Duration::ZERO);
        assert!(policy.is_below_threshold(0));
        assert!(policy.is_below_threshold(3));
        assert!(!policy.is_below_threshold(4));
    }

    #[test]
    fn test_zero_keep_has_no_threshold() {
        let policy = RetentionPolicy::new(0, Duration::ZERO);
        assert!(!policy.is_below_threshold(0));
    }

    #[test]
    fn test_nonzero_max_age_kept() {
        let age = Duration::from_secs(3600);
        assert_eq!(RetentionPolicy::new(1, age).max_age, Some(age));
    }
}
