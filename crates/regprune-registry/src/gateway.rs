//! [`RegistryGateway`] implementation backed by the HTTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regprune_core::{GatewayError, RegistryGateway};

use crate::client::RegistryClient;

#[async_trait]
impl RegistryGateway for RegistryClient {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, GatewayError> {
        Ok(Self::list_tags(self, repository).await?)
    }

    async fn image_created(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<DateTime<Utc>, GatewayError> {
        Ok(Self::image_created(self, repository, tag).await?)
    }

    async fn resolve_digest(&self, repository: &str, tag: &str) -> Result<String, GatewayError> {
        Ok(self.manifest_digest(repository, tag).await?)
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<(), GatewayError> {
        Ok(Self::delete_manifest(self, repository, digest).await?)
    }
}
