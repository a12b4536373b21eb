//! Image tag model.

use chrono::{DateTime, Utc};

/// Name of the tag that is never deleted.
pub const LATEST_TAG: &str = "latest";

/// An image tag within a single repository.
///
/// The creation time is unknown until the tag is enriched from the image
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name, unique within its repository.
    pub name: String,

    /// When the tagged image was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl Tag {
    /// Creates a tag without a creation time.
    ///
    /// # Examples
    ///
    /// ```
    /// use regprune_core::Tag;
    ///
    /// let tag = Tag::new("v1.2.0");
    /// assert!(tag.created_at.is_none());
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: None,
        }
    }

    /// Returns the tag with its creation time set.
    #[must_use]
    pub fn with_created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Returns true if this is the protected `latest` tag.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.name == LATEST_TAG
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_created() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tag = Tag::new("v1").with_created(at);
        assert_eq!(tag.created_at, Some(at));
        assert_eq!(tag.to_string(), "v1");
    }

    #[test]
    fn test_is_latest_is_exact() {
        assert!(Tag::new("latest").is_latest());
        assert!(!Tag::new("latest-dev").is_latest());
        assert!(!Tag::new("Latest").is_latest());
    }
}
