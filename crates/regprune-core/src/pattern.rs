//! Tag name matching against compiled regular expressions.

use regex::Regex;

use crate::error::{Error, Result};

/// Returns true if `name` matches any pattern in `patterns`.
///
/// An empty pattern list never matches. Matching is an unanchored search,
/// so `^` and `$` must be written explicitly for whole-name matches.
#[must_use]
pub fn matches(name: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(name))
}

/// An ordered set of compiled tag patterns.
///
/// # Examples
///
/// ```
/// use regprune_core::PatternSet;
///
/// let set = PatternSet::compile(["^v\\d+", "-rc$"]).unwrap();
/// assert!(set.matches("v12"));
/// assert!(set.matches("2.0-rc"));
/// assert!(!set.matches("main"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Creates an empty pattern set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Compiles every pattern, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that does not compile.
    pub fn compile<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if `name` matches at least one pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        matches(name, &self.patterns)
    }

    /// Returns true if the set contains no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the source text of each pattern.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}
