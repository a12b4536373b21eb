//! OCI Distribution Specification types.
//!
//! Only the parts needed to read image creation times and delete manifests
//! are modelled. Docker schema 2 and OCI documents share the same shape.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Manifest media types accepted from the registry.
pub struct MediaType;

impl MediaType {
    /// Docker image manifest, schema 2.
    pub const DOCKER_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker manifest list (multi-platform).
    pub const DOCKER_MANIFEST_LIST: &'static str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index media type.
    pub const OCI_INDEX: &'static str = "application/vnd.oci.image.index.v1+json";

    /// Value for the `Accept` header on manifest requests.
    #[must_use]
    pub fn manifest_accept() -> String {
        [
            Self::DOCKER_MANIFEST,
            Self::DOCKER_MANIFEST_LIST,
            Self::OCI_MANIFEST,
            Self::OCI_INDEX,
        ]
        .join(", ")
    }

    /// Returns true for the multi-platform media types.
    #[must_use]
    pub fn is_index(media_type: &str) -> bool {
        media_type == Self::DOCKER_MANIFEST_LIST || media_type == Self::OCI_INDEX
    }
}

/// Reference to a manifest or blob by digest.
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    /// Digest of the targeted content.
    pub digest: String,

    /// Platform, present on index entries.
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Platform of an index entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Platform {
    /// CPU architecture.
    pub architecture: String,
    /// Operating system.
    pub os: String,
}

/// An image manifest or an image index.
///
/// Image manifests carry a `config` descriptor; indexes carry `manifests`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Media type of this manifest, if declared in the body.
    #[serde(default)]
    pub media_type: Option<String>,

    /// Image configuration descriptor.
    #[serde(default)]
    pub config: Option<Descriptor>,

    /// Child manifests of an index.
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

impl Manifest {
    /// Returns true if this document is an index rather than an image manifest.
    ///
    /// The declared media type wins; undeclared documents are recognised by
    /// shape.
    #[must_use]
    pub fn is_index(&self) -> bool {
        match self.media_type.as_deref() {
            Some(media_type) if MediaType::is_index(media_type) => true,
            _ => self.config.is_none() && !self.manifests.is_empty(),
        }
    }

    /// Picks the index entry to read the creation time from: the first
    /// `linux/amd64` entry, otherwise the first entry.
    #[must_use]
    pub fn preferred_child(&self) -> Option<&Descriptor> {
        self.manifests
            .iter()
            .find(|d| {
                d.platform
                    .as_ref()
                    .is_some_and(|p| p.os == "linux" && p.architecture == "amd64")
            })
            .or_else(|| self.manifests.first())
    }
}

/// Image configuration blob; only the creation time is read.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// When the image was created.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// Response from the `/v2/<name>/tags/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TagList {
    /// List of tags. Some registries send `null` for an empty repository.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Error body returned by the registry.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    message: String,
}

impl ErrorResponse {
    /// Joins the error messages into one line.
    pub(crate) fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
