//! Registry client errors.

use std::path::PathBuf;

use regprune_core::GatewayError;
use thiserror::Error;

/// Failure talking to a registry.
///
/// `resource` fields read `repository:reference`, where the reference is a
/// tag, a digest or an endpoint name such as `tags/list`.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// 401 or 403.
    #[error("Registry refused access to {resource} ({status})")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// What was requested.
        resource: String,
    },

    /// 404.
    #[error("Not found: {repository}:{reference}")]
    NotFound {
        /// Repository name.
        repository: String,
        /// Tag, digest or endpoint.
        reference: String,
    },

    /// Any other non-success status.
    #[error("Registry returned {status} for {resource}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// What was requested.
        resource: String,
        /// Error summary from the response body.
        message: String,
    },

    /// A blob does not hash to the digest it was requested by.
    #[error("Digest mismatch for {repository}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Repository name.
        repository: String,
        /// Requested digest.
        expected: String,
        /// Computed digest.
        actual: String,
    },

    /// A response lacks something the client needs.
    #[error("Incomplete response for {resource}: missing {missing}")]
    Incomplete {
        /// What was requested.
        resource: String,
        /// The absent piece.
        missing: &'static str,
    },

    /// A JSON document could not be decoded.
    #[error("Malformed registry document: {0}")]
    Decode(#[from] serde_json::Error),

    /// Credentials contain bytes that cannot go into a header.
    #[error("{scheme} credentials are not valid header text")]
    InvalidCredentials {
        /// Credential scheme.
        scheme: &'static str,
    },

    /// The CA certificate file could not be read.
    #[error("Cannot read CA certificate {path}: {source}", path = path.display())]
    ReadCertificate {
        /// Certificate path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The CA certificate file is not valid PEM.
    #[error("Invalid CA certificate {path}: {source}", path = path.display())]
    BadCertificate {
        /// Certificate path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Cannot create HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// Base URL or pagination link is not a valid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// Offending text.
        url: String,
    },
}

impl RegistryError {
    pub(crate) fn incomplete(repository: &str, reference: &str, missing: &'static str) -> Self {
        Self::Incomplete {
            resource: format!("{repository}:{reference}"),
            missing,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map_or_else(|| "registry".to_string(), ToString::to_string);
        Self::Transport { url, source: err }
    }
}

impl From<RegistryError> for GatewayError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unauthorized { .. } | RegistryError::InvalidCredentials { .. } => {
                Self::Auth {
                    message: err.to_string(),
                }
            }
            RegistryError::NotFound {
                repository,
                reference,
            } => Self::NotFound {
                resource: format!("{repository}:{reference}"),
            },
            RegistryError::DigestMismatch { .. }
            | RegistryError::Incomplete { .. }
            | RegistryError::Decode(_) => Self::Protocol {
                message: err.to_string(),
            },
            RegistryError::Transport { .. }
            | RegistryError::UnexpectedStatus { .. }
            | RegistryError::ReadCertificate { .. }
            | RegistryError::BadCertificate { .. }
            | RegistryError::ClientSetup(_)
            | RegistryError::InvalidUrl { .. } => Self::Transport {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RegistryError::NotFound {
            repository: "library/app".to_string(),
            reference: "v1.2.0".to_string(),
        };
        assert_eq!(err.to_string(), "Not found: library/app:v1.2.0");

        let err = RegistryError::Unauthorized {
            status: 401,
            resource: "app:tags/list".to_string(),
        };
        assert_eq!(err.to_string(), "Registry refused access to app:tags/list (401)");

        let err = RegistryError::incomplete("app", "v1", "creation time");
        assert_eq!(err.to_string(), "Incomplete response for app:v1: missing creation time");
    }

    #[test]
    fn test_decode_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RegistryError = json_err.into();
        assert!(matches!(err, RegistryError::Decode(_)));
    }

    #[test]
    fn test_gateway_mapping() {
        let err: GatewayError = RegistryError::Unauthorized {
            status: 403,
            resource: "app:v1".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::Auth { .. }));

        let err: GatewayError = RegistryError::InvalidCredentials { scheme: "basic" }.into();
        assert!(matches!(err, GatewayError::Auth { .. }));

        let err: GatewayError = RegistryError::NotFound {
            repository: "app".to_string(),
            reference: "v1".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::NotFound { ref resource } if resource == "app:v1"));

        let err: GatewayError = RegistryError::UnexpectedStatus {
            status: 503,
            resource: "app:v1".to_string(),
            message: "maintenance".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::Transport { .. }));

        let err: GatewayError =
            RegistryError::incomplete("app", "v1", "Docker-Content-Digest header").into();
        assert!(matches!(err, GatewayError::Protocol { .. }));
    }
}
