//! Configuration structures for Vultr clients.
//!
//! This module provides the API credential and the endpoint configuration used
//! by the dispatcher, with serde defaults and field validation.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Production API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.vultr.com/v1/";

/// Default user agent name.
pub const DEFAULT_USER_AGENT: &str = "Vultr.com API Client";

/// Default client version sent after the agent name.
pub const DEFAULT_VERSION: &str = "1.0";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Static bearer token used to authenticate every request.
///
/// The token is held in a [`SecretString`] and is never printed by `Debug`.
#[derive(Clone)]
pub struct Credential {
    token: SecretString,
}

impl Credential {
    /// Wrap an API token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::ConfigError("Invalid token.".to_string()));
        }

        Ok(Self {
            token: SecretString::from(token),
        })
    }

    /// Return the raw token for request signing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Endpoint configuration for a Vultr client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VultrConfig {
    /// API base URL, overridable for testing against a mock server
    #[validate(url)]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// User agent name
    #[validate(length(min = 1))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Version appended to the user agent
    #[validate(length(min = 1))]
    #[serde(default = "default_version")]
    pub version: String,

    /// Log verb, URL and HTTP status of every request at `info`
    #[serde(default)]
    pub debug: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_tls_verify() -> bool {
    true
}

impl VultrConfig {
    /// Create a configuration for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            ..Self::default()
        };

        config.check()?;
        Ok(config)
    }

    /// Set the user agent name.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the version appended to the user agent.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable verbose request logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    ///
    /// Only disable verification against test environments.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// User-Agent header value, `"<agent> v<version>"`.
    #[must_use]
    pub fn user_agent_header(&self) -> String {
        format!("{} v{}", self.user_agent, self.version)
    }

    /// Run field validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the failing fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Parse the endpoint URL, ensuring it ends with `/` so relative paths
    /// append to it instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid endpoint URL: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "Endpoint URL cannot be a base: {}",
                self.endpoint
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(url)
    }
}

impl Default for VultrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            version: default_version(),
            debug: false,
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
        }
    }
}
