//! In-memory registry gateway for tests and dry experiments.
//!
//! Deleting a digest removes every tag that points at it, as a real
//! registry does.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::gateway::{GatewayError, RegistryGateway};

#[derive(Debug, Clone)]
struct StoredTag {
    created_at: DateTime<Utc>,
    digest: String,
}

/// A [`RegistryGateway`] backed by maps, with injectable failures.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    repositories: Mutex<BTreeMap<String, Vec<(String, StoredTag)>>>,
    failing_metadata: BTreeSet<String>,
    failing_delete: BTreeSet<String>,
    metadata_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryGateway {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag with its own digest. Tags are listed in insertion order.
    #[must_use]
    pub fn with_tag(self, repository: &str, tag: &str, created_at: DateTime<Utc>) -> Self {
        let digest = format!("sha256:{repository}-{tag}");
        self.with_tag_digest(repository, tag, created_at, &digest)
    }

    /// Adds a tag pointing at an explicit digest.
    #[must_use]
    pub fn with_tag_digest(
        self,
        repository: &str,
        tag: &str,
        created_at: DateTime<Utc>,
        digest: &str,
    ) -> Self {
        self.repositories
            .lock()
            .entry(repository.to_string())
            .or_default()
            .push((
                tag.to_string(),
                StoredTag {
                    created_at,
                    digest: digest.to_string(),
                },
            ));
        self
    }

    /// Makes metadata lookups for `tag` fail with a transport error.
    #[must_use]
    pub fn failing_metadata(mut self, tag: &str) -> Self {
        self.failing_metadata.insert(tag.to_string());
        self
    }

    /// Makes deletion of the manifest behind `tag` fail with a transport error.
    #[must_use]
    pub fn failing_delete(mut self, tag: &str) -> Self {
        self.failing_delete.insert(tag.to_string());
        self
    }

    /// Returns the tags still present in a repository, sorted by name.
    #[must_use]
    pub fn remaining_tags(&self, repository: &str) -> Vec<String> {
        let mut tags: Vec<String> = self
            .repositories
            .lock()
            .get(repository)
            .map(|tags| tags.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }

    /// Number of creation time lookups served.
    #[must_use]
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Number of delete requests received.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, repository: &str, tag: &str) -> Result<StoredTag, GatewayError> {
        self.repositories
            .lock()
            .get(repository)
            .and_then(|tags| tags.iter().find(|(name, _)| name == tag))
            .map(|(_, stored)| stored.clone())
            .ok_or_else(|| GatewayError::NotFound {
                resource: format!("{repository}:{tag}"),
            })
    }
}

#[async_trait]
impl RegistryGateway for InMemoryGateway {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, GatewayError> {
        self.repositories
            .lock()
            .get(repository)
            .map(|tags| tags.iter().map(|(name, _)| name.clone()).collect())
            .ok_or_else(|| GatewayError::NotFound {
                resource: repository.to_string(),
            })
    }

    async fn image_created(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<DateTime<Utc>, GatewayError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_metadata.contains(tag) {
            return Err(GatewayError::Transport {
                message: format!("connection reset fetching {repository}:{tag}"),
            });
        }
        self.lookup(repository, tag).map(|stored| stored.created_at)
    }

    async fn resolve_digest(&self, repository: &str, tag: &str) -> Result<String, GatewayError> {
        self.lookup(repository, tag).map(|stored| stored.digest)
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<(), GatewayError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut repositories = self.repositories.lock();
        let tags = repositories
            .get_mut(repository)
            .ok_or_else(|| GatewayError::NotFound {
                resource: repository.to_string(),
            })?;

        if tags
            .iter()
            .any(|(name, stored)| stored.digest == digest && self.failing_delete.contains(name))
        {
            return Err(GatewayError::Transport {
                message: format!("connection reset deleting {repository}@{digest}"),
            });
        }

        let before = tags.len();
        tags.retain(|(_, stored)| stored.digest != digest);
        if tags.len() == before {
            return Err(GatewayError::NotFound {
                resource: format!("{repository}@{digest}"),
            });
        }

        Ok(())
    }
}
