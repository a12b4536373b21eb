//! Registry gateway abstraction.
//!
//! The orchestrator only talks to a registry through [`RegistryGateway`];
//! the HTTP implementation lives in `regprune-registry`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by a registry gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The registry could not be reached or the request failed in transit.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The registry rejected the credentials.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error message.
        message: String,
    },

    /// The repository, tag, manifest or blob does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// What was looked up.
        resource: String,
    },

    /// The registry answered with something that could not be interpreted.
    #[error("Unexpected registry response: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },
}

/// Operations the prune run needs from a container registry.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Lists every tag name in a repository.
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, GatewayError>;

    /// Returns the creation time of the image a tag points to.
    async fn image_created(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<DateTime<Utc>, GatewayError>;

    /// Resolves a tag to its manifest digest.
    async fn resolve_digest(&self, repository: &str, tag: &str) -> Result<String, GatewayError>;

    /// Deletes a manifest by digest.
    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: RegistryGateway + ?Sized> RegistryGateway for &T {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, GatewayError> {
        (**self).list_tags(repository).await
    }

    async fn image_created(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<DateTime<Utc>, GatewayError> {
        (**self).image_created(repository, tag).await
    }

    async fn resolve_digest(&self, repository: &str, tag: &str) -> Result<String, GatewayError> {
        (**self).resolve_digest(repository, tag).await
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<(), GatewayError> {
        (**self).delete_manifest(repository, digest).await
    }
}
