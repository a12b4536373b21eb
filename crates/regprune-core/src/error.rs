//! Error types for regprune core operations.
//!
//! This module defines the error types used throughout the `regprune-core` crate.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or executing a prune run.
#[derive(Error, Debug)]
pub enum Error {
    /// The duration string contains no `<number><unit>` pair.
    #[error("Invalid duration format: '{input}' (expected e.g. 12h, 7d, 1m)")]
    InvalidDurationFormat {
        /// The rejected input.
        input: String,
    },

    /// The duration unit is not one of `h`, `d` or `m`.
    #[error("Unsupported duration unit '{unit}' (supported: h, d, m)")]
    UnsupportedUnit {
        /// The rejected unit.
        unit: String,
    },

    /// A tag pattern failed to compile.
    #[error("Invalid tag pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// No repository was configured.
    #[error("At least one repository is required")]
    MissingRepositories,

    /// A tag reached ranking without a creation time.
    #[error("Tag '{tag}' has no creation time")]
    MissingCreationTime {
        /// Tag name.
        tag: String,
    },

    /// The registry gateway failed while processing a repository.
    #[error("Registry operation failed for {repository}: {source}")]
    Gateway {
        /// Repository being processed.
        repository: String,
        /// Underlying gateway error.
        #[source]
        source: GatewayError,
    },
}

impl Error {
    /// Returns true if this error was raised while building configuration,
    /// before any registry call.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidDurationFormat { .. }
                | Self::UnsupportedUnit { .. }
                | Self::InvalidPattern { .. }
                | Self::MissingRepositories
        )
    }
}
