//! Prune run orchestration.
//!
//! Repositories are processed one at a time and every registry call is
//! awaited before the next one starts. The first error of any kind stops
//! the run; later repositories are never touched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::gateway::{GatewayError, RegistryGateway};
use crate::selector::{SelectionResult, TagSelector};
use crate::tag::{Tag, LATEST_TAG};

/// A tag removed from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTag {
    /// Tag name.
    pub tag: String,
    /// Manifest digest that was deleted.
    pub digest: String,
}

/// Outcome of processing one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    /// Repository name.
    pub repository: String,

    /// Number of tags listed by the registry.
    pub tags_found: usize,

    /// The selection decision.
    pub selection: SelectionResult,

    /// Tags actually deleted. Always empty in dry-run mode.
    pub deleted: Vec<DeletedTag>,

    /// Whether deletion was replaced by reporting.
    pub dry_run: bool,
}

impl RepositoryReport {
    /// Number of tags selected for deletion.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.to_delete.len()
    }

    /// Number of tags deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One report per repository, in processing order.
    pub repositories: Vec<RepositoryReport>,
}

impl RunReport {
    /// Total number of tags selected across repositories.
    #[must_use]
    pub fn total_selected(&self) -> usize {
        self.repositories
            .iter()
            .map(RepositoryReport::selected_count)
            .sum()
    }

    /// Total number of tags deleted across repositories.
    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.repositories
            .iter()
            .map(RepositoryReport::deleted_count)
            .sum()
    }
}

/// Drives selection and deletion over the configured repositories.
#[derive(Debug)]
pub struct Orchestrator<G> {
    gateway: G,
    config: RunConfig,
    now: Option<DateTime<Utc>>,
}

impl<G: RegistryGateway> Orchestrator<G> {
    /// Creates an orchestrator.
    #[must_use]
    pub const fn new(gateway: G, config: RunConfig) -> Self {
        Self {
            gateway,
            config,
            now: None,
        }
    }

    /// Pins the reference time used for age checks instead of the wall clock.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Processes every configured repository.
    ///
    /// # Errors
    ///
    /// Stops at the first repository that fails and returns its error.
    pub async fn run(&self) -> Result<RunReport> {
        self.run_with(|_| {}).await
    }

    /// Processes every configured repository, calling `on_report` as each
    /// one completes.
    ///
    /// # Errors
    ///
    /// Stops at the first repository that fails and returns its error.
    pub async fn run_with<F>(&self, mut on_report: F) -> Result<RunReport>
    where
        F: FnMut(&RepositoryReport) + Send,
    {
        let mut report = RunReport::default();

        for repository in &self.config.repositories {
            let repository_report = self.process_repository(repository).await?;
            on_report(&repository_report);
            report.repositories.push(repository_report);
        }

        Ok(report)
    }

    /// Computes the selection for one repository without deleting anything.
    ///
    /// Returns the number of listed tags and the selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gateway`] if listing tags or fetching a creation time fails.
    pub async fn plan(&self, repository: &str) -> Result<(usize, SelectionResult)> {
        let gateway_error = |source: GatewayError| Error::Gateway {
            repository: repository.to_string(),
            source,
        };

        info!(repository, "Searching for tags");
        let names = self
            .gateway
            .list_tags(repository)
            .await
            .map_err(gateway_error)?;
        let tags_found = names.len();

        let selector = TagSelector::new(&self.config.rules, &self.config.policy);
        let mut filtered = selector.filter(names.into_iter().map(Tag::new));

        if selector.is_below_threshold(&filtered) {
            info!(
                repository,
                matched = filtered.matched.len(),
                keep = self.config.policy.keep_newest,
                "Skipping repository: matched tags do not exceed the keep count"
            );
        } else {
            for tag in &mut filtered.matched {
                let created_at = self
                    .gateway
                    .image_created(repository, &tag.name)
                    .await
                    .map_err(gateway_error)?;
                debug!(repository, tag = %tag.name, %created_at, "Fetched creation time");
                tag.created_at = Some(created_at);
            }
        }

        let now = self.now.unwrap_or_else(Utc::now);
        let selection = selector.select_filtered(filtered, now)?;

        info!(
            repository,
            found = tags_found,
            matched = selection.matched,
            skipped = selection.skipped,
            selected = selection.to_delete.len(),
            "Selection complete"
        );

        Ok((tags_found, selection))
    }

    /// Selects and deletes tags for one repository.
    ///
    /// Every selected tag is resolved to its manifest digest before anything
    /// is deleted. Tags sharing a digest cost a single delete and are all
    /// reported as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gateway`] on the first failing registry call; tags
    /// after the failing one are not deleted.
    pub async fn process_repository(&self, repository: &str) -> Result<RepositoryReport> {
        let (tags_found, selection) = self.plan(repository).await?;
        let mut deleted = Vec::new();

        if self.config.dry_run {
            for tag in &selection.to_delete {
                info!(repository, tag = %tag.name, "[dry run] tag would be deleted");
            }
        } else if !selection.to_delete.is_empty() {
            deleted = self.delete_tags(repository, &selection).await?;
        }

        Ok(RepositoryReport {
            repository: repository.to_string(),
            tags_found,
            selection,
            deleted,
            dry_run: self.config.dry_run,
        })
    }

    async fn delete_tags(
        &self,
        repository: &str,
        selection: &SelectionResult,
    ) -> Result<Vec<DeletedTag>> {
        let gateway_error = |source: GatewayError| Error::Gateway {
            repository: repository.to_string(),
            source,
        };

        let mut resolved = Vec::with_capacity(selection.to_delete.len());
        for tag in &selection.to_delete {
            let digest = self
                .gateway
                .resolve_digest(repository, &tag.name)
                .await
                .map_err(gateway_error)?;
            resolved.push(DeletedTag {
                tag: tag.name.clone(),
                digest,
            });
        }

        let latest_digest = self.latest_digest(repository).await;
        let mut removed = HashSet::new();

        for entry in &resolved {
            if latest_digest.as_deref() == Some(entry.digest.as_str()) {
                warn!(
                    repository,
                    tag = %entry.tag,
                    digest = %entry.digest,
                    "Tag shares its manifest with latest; deleting it removes latest too"
                );
            }

            if removed.contains(entry.digest.as_str()) {
                debug!(
                    repository,
                    tag = %entry.tag,
                    digest = %entry.digest,
                    "Manifest already deleted through another tag"
                );
                continue;
            }

            self.gateway
                .delete_manifest(repository, &entry.digest)
                .await
                .map_err(gateway_error)?;
            info!(repository, tag = %entry.tag, digest = %entry.digest, "Deleted tag");
            removed.insert(entry.digest.as_str());
        }

        Ok(resolved)
    }

    /// Digest behind `latest`, if the repository has one.
    async fn latest_digest(&self, repository: &str) -> Option<String> {
        match self.gateway.resolve_digest(repository, LATEST_TAG).await {
            Ok(digest) => Some(digest),
            Err(GatewayError::NotFound { .. }) => None,
            Err(err) => {
                warn!(repository, error = %err, "Could not resolve latest");
                None
            }
        }
    }
}
