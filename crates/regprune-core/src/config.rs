//! Run configuration.
//!
//! A [`RunConfig`] is built once from user input and then only read. Every
//! configuration error (bad pattern, bad duration, no repository) is raised
//! by [`RunConfigBuilder::build`], before any registry traffic.

use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::pattern::PatternSet;
use crate::policy::{FilterRuleSet, RetentionPolicy};

/// Default number of newest matching tags kept per repository.
pub const DEFAULT_KEEP_NEWEST: usize = 10;

/// Validated, immutable settings for a prune run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repositories to process, in order.
    pub repositories: Vec<String>,

    /// Tag filter rules.
    pub rules: FilterRuleSet,

    /// Retention policy.
    pub policy: RetentionPolicy,

    /// Report what would be deleted without deleting it.
    pub dry_run: bool,
}

impl RunConfig {
    /// Starts building a configuration.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Unvalidated run settings, as collected from the command line.
///
/// # Examples
///
/// ```
/// use regprune_core::RunConfig;
///
/// let config = RunConfig::builder()
///     .repository("library/app")
///     .include("^v\\d+")
///     .keep_newest(3)
///     .older_than("30d")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.repositories, vec!["library/app"]);
/// assert_eq!(config.policy.keep_newest, 3);
/// ```
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    repositories: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    keep_newest: usize,
    older_than: String,
    dry_run: bool,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            keep_newest: DEFAULT_KEEP_NEWEST,
            older_than: String::new(),
            dry_run: false,
        }
    }
}

impl RunConfigBuilder {
    /// Adds a repository.
    #[must_use]
    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repositories.push(repository.into());
        self
    }

    /// Adds several repositories.
    #[must_use]
    pub fn repositories<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repositories
            .extend(repositories.into_iter().map(Into::into));
        self
    }

    /// Adds an include pattern.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Adds several include patterns.
    #[must_use]
    pub fn includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds an exclude pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Adds several exclude patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets how many newest matching tags are kept. Zero disables the floor.
    #[must_use]
    pub const fn keep_newest(mut self, keep_newest: usize) -> Self {
        self.keep_newest = keep_newest;
        self
    }

    /// Sets the age cutoff as a relative duration such as `7d`. Empty disables it.
    #[must_use]
    pub fn older_than(mut self, older_than: impl Into<String>) -> Self {
        self.older_than = older_than.into();
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validates the settings and produces a [`RunConfig`].
    ///
    /// Empty repository names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRepositories`], [`Error::InvalidPattern`],
    /// [`Error::InvalidDurationFormat`] or [`Error::UnsupportedUnit`].
    pub fn build(self) -> Result<RunConfig> {
        let repositories: Vec<String> = self
            .repositories
            .into_iter()
            .filter(|repository| !repository.is_empty())
            .collect();

        if repositories.is_empty() {
            return Err(Error::MissingRepositories);
        }

        let max_age = parse_duration(&self.older_than)?;
        let rules = FilterRuleSet::new(
            PatternSet::compile(&self.include)?,
            PatternSet::compile(&self.exclude)?,
        );

        Ok(RunConfig {
            repositories,
            rules,
            policy: RetentionPolicy::new(self.keep_newest, max_age),
            dry_run: self.dry_run,
        })
    }
}
