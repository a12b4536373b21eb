//! OCI Distribution API client.
//!
//! This module provides the HTTP client used to list tags, read image
//! creation times and delete manifests.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::oci::{ErrorResponse, ImageConfig, Manifest, MediaType, TagList};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::RequestBuilder;
use sha2::{Digest, Sha256};
use url::Url;

/// Response header carrying the manifest digest.
const DIGEST_HEADER: &str = "docker-content-digest";

/// Client for interacting with OCI-compatible registries.
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    base: Url,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Creates a new registry client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, a certificate cannot be
    /// loaded or the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use regprune_registry::{RegistryClient, RegistryConfig};
    ///
    /// let config = RegistryConfig::new("https://registry.example.com");
    /// let client = RegistryClient::new(config)?;
    /// # Ok::<(), regprune_registry::RegistryError>(())
    /// ```
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let base = Url::parse(&config.base_url).map_err(|_| RegistryError::InvalidUrl {
            url: config.base_url.clone(),
        })?;
        let http = Self::build_http_client(&config)?;

        Ok(Self { config, base, http })
    }

    /// Lists all tags of a repository, following pagination links.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository does not exist or the tags cannot
    /// be retrieved.
    pub async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        let mut tags = Vec::new();
        let mut next = Some(self.endpoint(&format!("/v2/{repository}/tags/list"))?);

        while let Some(url) = next.take() {
            let response = self
                .send(self.http.get(url), repository, "tags/list")
                .await?;

            next = match response.headers().get(LINK).and_then(|v| v.to_str().ok()) {
                Some(link) => next_link(link)
                    .map(|target| self.resolve_link(&target))
                    .transpose()?,
                None => None,
            };

            let page: TagList = serde_json::from_slice(&response.bytes().await?)?;
            tags.extend(page.tags.unwrap_or_default());
        }

        tracing::debug!(repository, count = tags.len(), "Listed tags");
        Ok(tags)
    }

    /// Fetches a manifest or index by tag or digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest does not exist or cannot be parsed.
    pub async fn fetch_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<Manifest, RegistryError> {
        let url = self.endpoint(&format!("/v2/{repository}/manifests/{reference}"))?;

        let request = self
            .http
            .get(url)
            .header(ACCEPT, MediaType::manifest_accept());
        let response = self.send(request, repository, reference).await?;

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }

    /// Fetches a blob and verifies its sha256 digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be fetched or its content does
    /// not match the digest.
    pub async fn fetch_blob(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let url = self.endpoint(&format!("/v2/{repository}/blobs/{digest}"))?;

        let response = self.send(self.http.get(url), repository, digest).await?;
        let data = response.bytes().await?.to_vec();

        if digest.starts_with("sha256:") {
            let actual = Self::compute_digest(&data);
            if actual != digest {
                return Err(RegistryError::DigestMismatch {
                    repository: repository.to_string(),
                    expected: digest.to_string(),
                    actual,
                });
            }
        }

        Ok(data)
    }

    /// Fetches the image configuration a tag points to.
    ///
    /// For an index, the `linux/amd64` entry (or the first entry) is used.
    ///
    /// # Errors
    ///
    /// Returns an error if any document is missing or malformed.
    pub async fn image_config(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<ImageConfig, RegistryError> {
        let mut manifest = self.fetch_manifest(repository, tag).await?;

        if manifest.is_index() {
            let child = manifest
                .preferred_child()
                .map(|d| d.digest.clone())
                .ok_or_else(|| RegistryError::incomplete(repository, tag, "index entries"))?;
            tracing::debug!(repository, tag, %child, "Following index entry");
            manifest = self.fetch_manifest(repository, &child).await?;
        }

        let config = manifest
            .config
            .ok_or_else(|| RegistryError::incomplete(repository, tag, "config descriptor"))?;

        let data = self.fetch_blob(repository, &config.digest).await?;
        serde_json::from_slice(&data).map_err(Into::into)
    }

    /// Returns when the image behind a tag was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the image configuration cannot be read or has no
    /// `created` field.
    pub async fn image_created(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<DateTime<Utc>, RegistryError> {
        self.image_config(repository, tag)
            .await?
            .created
            .ok_or_else(|| RegistryError::incomplete(repository, tag, "creation time"))
    }

    /// Resolves a tag to the digest of the manifest it points to.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag does not exist or the registry does not
    /// return a digest header.
    pub async fn manifest_digest(
        &self,
        repository: &str,
        tag: &str,
    ) -> Result<String, RegistryError> {
        let url = self.endpoint(&format!("/v2/{repository}/manifests/{tag}"))?;

        let request = self
            .http
            .head(url)
            .header(ACCEPT, MediaType::manifest_accept());
        let response = self.send(request, repository, tag).await?;

        response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .ok_or_else(|| {
                RegistryError::incomplete(repository, tag, "Docker-Content-Digest header")
            })
    }

    /// Deletes a manifest by digest. Every tag pointing at it disappears.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the deletion.
    pub async fn delete_manifest(
        &self,
        repository: &str,
        digest: &str,
    ) -> Result<(), RegistryError> {
        let url = self.endpoint(&format!("/v2/{repository}/manifests/{digest}"))?;

        self.send(self.http.delete(url), repository, digest)
            .await
            .map(drop)
    }

    /// Builds an absolute endpoint URL from a `/v2/...` path.
    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        let url = format!("{}{path}", self.config.base_url);
        Url::parse(&url).map_err(|_| RegistryError::InvalidUrl { url })
    }

    /// Resolves a pagination link, which may be relative to the registry root.
    fn resolve_link(&self, link: &str) -> Result<Url, RegistryError> {
        self.base.join(link).map_err(|_| RegistryError::InvalidUrl {
            url: link.to_string(),
        })
    }

    /// Attaches credentials, sends the request and rejects error statuses.
    async fn send(
        &self,
        request: RequestBuilder,
        repository: &str,
        reference: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let response = request.headers(self.auth_headers()?).send().await?;
        tracing::trace!(repository, reference, status = %response.status(), "Registry response");
        Self::check_status(response, repository, reference).await
    }

    /// Maps error statuses to registry errors.
    async fn check_status(
        response: reqwest::Response,
        repository: &str,
        reference: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            code @ (401 | 403) => Err(RegistryError::Unauthorized {
                status: code,
                resource: format!("{repository}:{reference}"),
            }),
            404 => Err(RegistryError::NotFound {
                repository: repository.to_string(),
                reference: reference.to_string(),
            }),
            code => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map_or(body, |errors| errors.summary());
                Err(RegistryError::UnexpectedStatus {
                    status: code,
                    resource: format!("{repository}:{reference}"),
                    message,
                })
            }
        }
    }

    /// Builds the HTTP client from timeout, user agent and TLS settings.
    fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent);

        if config.tls.accept_invalid_certs {
            tracing::warn!(url = %config.base_url, "TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref ca_cert) = config.tls.ca_cert {
            let cert_pem = std::fs::read(ca_cert).map_err(|source| RegistryError::ReadCertificate {
                path: ca_cert.clone(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|source| {
                RegistryError::BadCertificate {
                    path: ca_cert.clone(),
                    source,
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }

        builder.build().map_err(RegistryError::ClientSetup)
    }

    /// Headers carrying the configured credentials.
    fn auth_headers(&self) -> Result<HeaderMap, RegistryError> {
        let mut headers = HeaderMap::new();

        if let Some(value) = self.config.credentials.authorization() {
            let mut value =
                HeaderValue::from_str(&value).map_err(|_| RegistryError::InvalidCredentials {
                    scheme: self.config.credentials.scheme(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Computes SHA-256 digest of data.
    fn compute_digest(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        is_next.then(|| target.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn test_client_creation() {
        let config = RegistryConfig::new("https://registry.example.com");
        let client = RegistryClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let err = RegistryClient::new(RegistryConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl { .. }));
    }

    #[test]
    fn test_endpoint() {
        let client =
            RegistryClient::new(RegistryConfig::new("https://registry.example.com/")).unwrap();
        let url = client.endpoint("/v2/team/app/tags/list").unwrap();
        assert_eq!(url.as_str(), "https://registry.example.com/v2/team/app/tags/list");
    }

    #[test]
    fn test_resolve_relative_link() {
        let client =
            RegistryClient::new(RegistryConfig::new("https://registry.example.com")).unwrap();
        let url = client
            .resolve_link("/v2/app/tags/list?n=100&last=v9")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://registry.example.com/v2/app/tags/list?n=100&last=v9"
        );
    }

    #[test]
    fn test_next_link() {
        let header = r#"</v2/app/tags/list?last=v9&n=100>; rel="next""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("/v2/app/tags/list?last=v9&n=100")
        );
    }

    #[test]
    fn test_next_link_ignores_other_relations() {
        let header = r#"<https://r.example.com/v2/app/tags/list?last=a>; rel="prev", <https://r.example.com/v2/app/tags/list?last=z>; rel="next""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://r.example.com/v2/app/tags/list?last=z")
        );
        assert_eq!(next_link(r#"</x>; rel="prev""#), None);
        assert_eq!(next_link("garbage"), None);
    }

    #[test]
    fn test_compute_digest() {
        let digest = RegistryClient::compute_digest(b"test data");
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), 7 + 64); // "sha256:" + 64 hex chars
    }

    #[test]
    fn test_auth_headers_anonymous() {
        let client = RegistryClient::new(RegistryConfig::new("https://example.com")).unwrap();
        assert!(client.auth_headers().unwrap().is_empty());
    }

    #[test]
    fn test_auth_headers_are_sensitive() {
        let config = RegistryConfig::new("https://example.com")
            .credentials(Credentials::basic("user", "pass"));
        let client = RegistryClient::new(config).unwrap();
        let headers = client.auth_headers().unwrap();

        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic dXNlcjpwYXNz");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_auth_headers_reject_newlines() {
        let config = RegistryConfig::new("https://example.com")
            .credentials(Credentials::bearer("bad\ntoken"));
        let client = RegistryClient::new(config).unwrap();
        assert!(matches!(
            client.auth_headers(),
            Err(RegistryError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn test_missing_ca_cert() {
        let config = RegistryConfig::new("https://example.com").ca_cert("/nonexistent/ca.pem");
        let err = RegistryClient::new(config).unwrap_err();
        assert!(matches!(err, RegistryError::ReadCertificate { .. }));
    }
}
