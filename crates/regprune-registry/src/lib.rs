//! # regprune Registry
//!
//! OCI Distribution API client used by regprune to inspect and delete tags.
//!
//! The client implements [`regprune_core::RegistryGateway`]:
//!
//! - `GET /v2/<name>/tags/list` (with `Link` pagination) to list tags
//! - `GET /v2/<name>/manifests/<tag>` and `GET /v2/<name>/blobs/<digest>`
//!   to read the image creation time
//! - `HEAD /v2/<name>/manifests/<tag>` to resolve the manifest digest
//! - `DELETE /v2/<name>/manifests/<digest>` to delete
//!
//! Authentication is limited to basic credentials or a pre-issued bearer
//! token; the token exchange flow is not implemented.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regprune_registry::{Credentials, RegistryClient, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistryConfig::new("https://registry.example.com")
//!         .credentials(Credentials::basic("user", "pass"));
//!
//!     let client = RegistryClient::new(config)?;
//!     let tags = client.list_tags("team/app").await?;
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod error;
mod gateway;
mod oci;

pub use client::RegistryClient;
pub use config::{Credentials, RegistryConfig, TlsOptions, DEFAULT_REGISTRY_URL};
pub use error::RegistryError;
pub use oci::{Descriptor, ImageConfig, Manifest, MediaType, Platform, TagList};
