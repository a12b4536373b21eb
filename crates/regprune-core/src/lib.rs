//! # regprune Core
//!
//! Retention policy engine for container image tags.
//!
//! Given a repository's tag list, this crate decides which tags to delete:
//!
//! - [`parse_duration`] - relative durations such as `7d` for the age cutoff
//! - [`PatternSet`] - compiled include/exclude regular expressions
//! - [`TagSelector`] - filtering, ranking, keep floor and age cutoff
//! - [`RegistryGateway`] - what the engine needs from a registry
//! - [`Orchestrator`] - runs selection and deletion over repositories
//!
//! ## Example
//!
//! ```rust
//! use regprune_core::RunConfig;
//!
//! let config = RunConfig::builder()
//!     .repository("library/app")
//!     .exclude("^keep-")
//!     .keep_newest(5)
//!     .older_than("1m")
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.policy.keep_newest, 5);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod duration;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod pattern;
pub mod policy;
pub mod selector;
pub mod tag;
pub mod testing;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use config::{RunConfig, RunConfigBuilder, DEFAULT_KEEP_NEWEST};
pub use duration::parse_duration;
pub use error::{Error, Result};
pub use gateway::{GatewayError, RegistryGateway};
pub use orchestrator::{DeletedTag, Orchestrator, RepositoryReport, RunReport};
pub use pattern::PatternSet;
pub use policy::{FilterRuleSet, RetentionPolicy, SkipReason};
pub use selector::{FilterOutcome, SelectionResult, TagSelector};
pub use tag::{Tag, LATEST_TAG};
