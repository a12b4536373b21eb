//! Connection settings for a registry.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;

/// Registry used when no base URL is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry-1.docker.io";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How to reach and authenticate against one registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL without trailing slash, e.g. `https://registry.example.com`.
    pub base_url: String,

    /// Credentials sent with every request.
    pub credentials: Credentials,

    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,

    /// Certificate handling.
    pub tls: TlsOptions,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

impl RegistryConfig {
    /// Creates settings for the registry at `base_url`.
    ///
    /// Trailing slashes are dropped so `/v2/...` paths can be appended.
    ///
    /// ```
    /// use regprune_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("https://registry.example.com/");
    /// assert_eq!(config.base_url, "https://registry.example.com");
    /// ```
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            credentials: Credentials::Anonymous,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tls: TlsOptions::default(),
            user_agent: concat!("regprune/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Replaces the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replaces the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disables certificate verification when `accept` is true.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.tls.accept_invalid_certs = accept;
        self
    }

    /// Trusts an additional PEM root certificate.
    #[must_use]
    pub fn ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls.ca_cert = Some(path.into());
        self
    }

    /// Returns true if certificate verification is disabled.
    #[must_use]
    pub const fn is_insecure(&self) -> bool {
        self.tls.accept_invalid_certs
    }
}

/// Credentials presented to the registry.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No `Authorization` header.
    Anonymous,

    /// HTTP basic authentication.
    Basic {
        /// Login name.
        username: String,
        /// Password or access token.
        password: String,
    },

    /// A bearer token obtained out of band.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl Credentials {
    /// Basic credentials.
    ///
    /// ```
    /// use regprune_registry::Credentials;
    ///
    /// let credentials = Credentials::basic("user", "pass");
    /// assert_eq!(credentials.authorization().as_deref(), Some("Basic dXNlcjpwYXNz"));
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer token credentials.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Value for the `Authorization` header, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
            Self::Bearer { token } => Some(format!("Bearer {token}")),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Basic { .. } => "basic",
            Self::Bearer { .. } => "bearer",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Certificate handling for HTTPS registries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Skip certificate verification (self-signed registries).
    pub accept_invalid_certs: bool,

    /// Extra PEM root certificate to trust.
    pub ca_cert: Option<PathBuf>,
}
