//! Request dispatcher and HTTP transport.
//!
//! [`Dispatcher::dispatch`] turns one logical operation (verb, relative path,
//! parameters, result shape) into exactly one authenticated HTTP round trip and
//! normalizes the reply into an [`Outcome`] or an [`Error`]. No per-call state is
//! stored on the dispatcher, so one instance can serve concurrent tasks.

use crate::config::{Credential, VultrConfig};
use crate::error::{check_status, Error, Result};
use crate::query::RequestParams;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use url::form_urlencoded;
use url::Url;

/// Bare response body the provider sends on some authentication failures.
pub const INVALID_API_KEY_BODY: &str = "Invalid API key";

/// Maximum number of redirects followed per request.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP verbs used by the v1 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Reads; parameters go in the query string
    Get,
    /// Writes; parameters go in a url-encoded body
    Post,
}

impl Verb {
    /// Upper-case verb name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Equivalent [`reqwest::Method`].
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller wants back from a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultShape {
    /// Classify the status and decode the JSON body
    Payload,
    /// Return the raw HTTP status, whatever it is
    StatusCode,
}

/// Successful result of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Decoded JSON object or array
    Payload(Value),
    /// Raw HTTP status code
    Status(u16),
}

impl Outcome {
    /// Unwrap a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] when the outcome is a status code.
    pub fn into_payload(self) -> Result<Value> {
        match self {
            Self::Payload(value) => Ok(value),
            Self::Status(status) => Err(Error::DecodeError(format!(
                "expected a decoded payload, got HTTP status {status}"
            ))),
        }
    }

    /// Unwrap a status code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] when the outcome is a payload.
    pub fn into_status(self) -> Result<u16> {
        match self {
            Self::Status(status) => Ok(status),
            Self::Payload(_) => Err(Error::DecodeError(
                "expected an HTTP status, got a decoded payload".to_string(),
            )),
        }
    }
}

/// Fully assembled request, ready for a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP verb
    pub verb: Verb,
    /// Absolute URL including the `api_key` query parameter
    pub url: Url,
    /// Url-encoded form body, POST only
    pub body: Option<String>,
}

impl PreparedRequest {
    /// URL with the API key replaced, safe to log.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(key, value)| {
                if key == "api_key" {
                    (key.into_owned(), "REDACTED".to_string())
                } else {
                    (key.into_owned(), value.into_owned())
                }
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a response value.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes one prepared request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the round trip and return status and body.
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Idle connections are never pooled, so each call opens and closes its own
/// connection.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the HTTP client from the endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the client cannot be constructed,
    /// for example when the user agent is not a valid header value.
    pub fn new(config: &VultrConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !config.tls_verify {
            warn!("TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent_header())
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse> {
        let mut builder = self.client.request(request.verb.method(), request.url);
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Builder for [`Dispatcher`].
#[derive(Clone)]
pub struct DispatcherBuilder {
    credential: Credential,
    config: VultrConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("credential", &self.credential)
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl DispatcherBuilder {
    /// Create a builder for the given API token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            credential: Credential::new(token)?,
            config: VultrConfig::default(),
            transport: None,
        })
    }

    /// Replace the whole endpoint configuration.
    #[must_use]
    pub fn with_config(mut self, config: VultrConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Override the user agent name.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config = self.config.with_user_agent(agent);
        self
    }

    /// Override the version appended to the user agent.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config = self.config.with_version(version);
        self
    }

    /// Enable or disable verbose request logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config = self.config.with_debug(debug);
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config = self.config.with_timeout(seconds);
        self
    }

    /// Set whether TLS certificates are verified.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.config = self.config.with_tls_verify(verify);
        self
    }

    /// Use a custom transport instead of the `reqwest` one.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Current endpoint configuration.
    #[must_use]
    pub const fn config(&self) -> &VultrConfig {
        &self.config
    }

    /// Build the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation or the HTTP
    /// client cannot be built.
    pub fn build(self) -> Result<Dispatcher> {
        self.config.check()?;
        let endpoint = self.config.parse_endpoint()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        Ok(Dispatcher {
            endpoint,
            credential: self.credential,
            debug: self.config.debug,
            transport,
        })
    }
}

/// Authenticated request dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: Url,
    credential: Credential,
    debug: bool,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("credential", &self.credential)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Start building a dispatcher for the given API token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the token is empty.
    pub fn builder(token: impl Into<String>) -> Result<DispatcherBuilder> {
        DispatcherBuilder::new(token)
    }

    /// Return the API base URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Assemble the URL and body for one request.
    ///
    /// The URL is `endpoint + path + "?api_key=" + token`; GET parameters follow
    /// the key in the query string, POST parameters form the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an empty path or one that would
    /// resolve outside the endpoint.
    pub fn prepare(
        &self,
        verb: Verb,
        path: &str,
        params: &RequestParams,
    ) -> Result<PreparedRequest> {
        let relative = relative_path(path)?;

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint(format!("{} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .extend(relative.split('/'));

        let body = {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", self.credential.expose());

            match verb {
                Verb::Get => {
                    for (key, value) in params.iter() {
                        query.append_pair(key, &value);
                    }
                    None
                }
                Verb::Post => Some(
                    form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(params.iter())
                        .finish(),
                ),
            }
        };

        Ok(PreparedRequest { verb, url, body })
    }

    /// Perform one round trip and normalize its result.
    ///
    /// The bare `Invalid API key` body is an [`Error::AuthError`] whatever the
    /// status. With [`ResultShape::StatusCode`] any other response yields its
    /// status, including 4xx and 5xx. With [`ResultShape::Payload`] non-2xx
    /// statuses map to their error kind and the body must decode to a JSON
    /// object or array.
    ///
    /// # Errors
    ///
    /// Returns transport, classification, and decode errors.
    pub async fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        params: &RequestParams,
        shape: ResultShape,
    ) -> Result<Outcome> {
        let request = self.prepare(verb, path, params)?;
        let url = request.redacted_url();

        if self.debug {
            info!(%verb, %url, "dispatching request");
        } else {
            debug!(%verb, %url, "dispatching request");
        }

        let response = self.transport.send(request).await.map_err(|err| {
            log_failure(verb, &url, &err);
            err
        })?;
        let status = response.status.as_u16();

        if self.debug {
            info!(%verb, %url, status, "received response");
        } else {
            trace!(%verb, %url, status, "received response");
        }

        if response.body.trim() == INVALID_API_KEY_BODY {
            warn!(%url, status, "provider rejected the API key");
            return Err(Error::AuthError(INVALID_API_KEY_BODY.to_string()));
        }

        match shape {
            ResultShape::StatusCode => Ok(Outcome::Status(status)),
            ResultShape::Payload => check_status(response.status, &response.body)
                .and_then(|()| decode_payload(&response.body))
                .map(Outcome::Payload)
                .map_err(|err| {
                    log_failure(verb, &url, &err);
                    err
                }),
        }
    }
}

fn log_failure(verb: Verb, url: &str, err: &Error) {
    if err.should_log() {
        error!(%verb, %url, code = err.error_code(), error = %err, "request failed");
    } else {
        debug!(%verb, %url, code = err.error_code(), error = %err, "request failed");
    }
}

/// Check that `path` stays below the endpoint, dropping any leading slash.
fn relative_path(path: &str) -> Result<&str> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return Err(Error::InvalidRequest("empty API path".to_string()));
    }
    if relative.contains([':', '?', '#', '\\']) {
        return Err(Error::InvalidRequest(format!(
            "API path `{relative}` must be a plain relative path"
        )));
    }
    if relative
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(Error::InvalidRequest(format!(
            "API path `{relative}` has an empty or dot segment"
        )));
    }
    Ok(relative)
}

/// Decode a response body that must be a JSON object or array.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] for empty, malformed or scalar bodies.
pub fn decode_payload(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(Error::DecodeError("empty response body".to_string()));
    }

    match serde_json::from_str::<Value>(body)? {
        value @ (Value::Object(_) | Value::Array(_)) => Ok(value),
        other => Err(Error::DecodeError(format!(
            "expected a JSON object or array, got `{other}`"
        ))),
    }
}
