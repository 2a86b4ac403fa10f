//! client configuration
//!
//! build a [`ClientConfig`] with the graphql endpoint and optional overrides.
//! pass it to [`crate::Client::new`] to create a client.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// env var holding the graphql endpoint for [`ClientConfig::from_env`]
pub const ENDPOINT_ENV: &str = "GRAPHQL_URL";

/// env var holding the optional bearer token for [`ClientConfig::from_env`]
pub const TOKEN_ENV: &str = "GRAPHQL_TOKEN";

/// configuration for the graphql client
#[derive(Clone)]
pub struct ClientConfig {
    /// original endpoint input
    pub(crate) raw_endpoint: String,

    /// graphql endpoint every request is posted to (e.g., "<https://api.github.com/graphql>")
    pub(crate) endpoint: std::result::Result<Url, url::ParseError>,

    /// bearer token sent in the authorization header
    pub(crate) token: Option<String>,

    /// request timeout duration
    pub(crate) timeout: Duration,

    /// user agent string
    pub(crate) user_agent: String,

    /// whether to verify ssl certificates
    pub(crate) verify_ssl: bool,

    /// additional headers to send with every request
    pub(crate) extra_headers: HeaderMap,

    /// prebuilt http client (takes precedence over http_client_builder)
    pub(crate) http_client: Option<reqwest::Client>,

    /// callback to customize the http client builder before building
    pub(crate) http_client_builder:
        Option<Arc<dyn Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync>>,
}

impl ClientConfig {
    /// create a new client configuration
    ///
    /// the endpoint is used as-is: requests are posted to it directly.
    ///
    /// # example
    ///
    /// ```
    /// use graphql_bind::ClientConfig;
    ///
    /// let config = ClientConfig::new("https://api.github.com/graphql")
    ///     .with_bearer_token("your-token-here");
    /// ```
    pub fn new(endpoint: impl AsRef<str>) -> Self {
        let raw = endpoint.as_ref().trim();

        let endpoint = if raw.contains("://") {
            Url::parse(raw)
        } else {
            Url::parse(&format!("https://{}", raw))
        };

        Self {
            raw_endpoint: raw.to_string(),
            endpoint,
            token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("graphql-bind/{} (Rust)", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            extra_headers: HeaderMap::new(),
            http_client: None,
            http_client_builder: None,
        }
    }

    /// build a configuration from `GRAPHQL_URL` and `GRAPHQL_TOKEN`
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .map_err(|_| Error::Config(format!("{ENDPOINT_ENV} is not set")))?;
        let config = Self::new(endpoint);
        Ok(match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => config.with_bearer_token(token),
            _ => config,
        })
    }

    /// send `Authorization: bearer <token>` with every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// set the request timeout
    ///
    /// default: 30 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// set a custom user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// disable ssl certificate verification (not recommended for production)
    ///
    /// default: enabled
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// add a header to every request
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }

    /// add a set of headers to every request
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers.extend(headers);
        self
    }

    /// access extra headers configured on this client
    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// inject a prebuilt http client.
    ///
    /// when set, this client is used as-is and takes precedence over
    /// `with_http_client_builder`. auth headers, tls, timeouts, and the user
    /// agent all come from the prebuilt client; the matching `ClientConfig`
    /// fields are ignored.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// customize the http client builder before the client is created.
    ///
    /// the callback receives a builder that already has the auth header,
    /// extra headers, user agent, timeout, and ssl settings applied.
    ///
    /// ignored if `with_http_client` is also set.
    pub fn with_http_client_builder<F>(mut self, f: F) -> Self
    where
        F: Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static,
    {
        self.http_client_builder = Some(Arc::new(f));
        self
    }

    /// validate the configuration and return the endpoint
    pub(crate) fn validate(&self) -> Result<&Url> {
        let endpoint = self.endpoint.as_ref().map_err(|err| Error::Url(*err))?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(Error::Config(format!(
                "invalid url scheme: {}. must be http or https",
                endpoint.scheme()
            )));
        }

        if self.token.as_deref() == Some("") {
            return Err(Error::Config("bearer token cannot be empty".to_string()));
        }

        Ok(endpoint)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.raw_endpoint)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("verify_ssl", &self.verify_ssl)
            .field("extra_headers", &self.extra_headers.len())
            .field("http_client", &self.http_client.is_some())
            .field("http_client_builder", &self.http_client_builder.is_some())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = ClientConfig::new("https://api.github.com/graphql");
        assert_eq!(
            config.endpoint.as_ref().unwrap().as_str(),
            "https://api.github.com/graphql"
        );
        assert!(config.token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_scheme_defaults_to_https() {
        let config = ClientConfig::new("api.example.com/graphql");
        assert_eq!(
            config.validate().unwrap().as_str(),
            "https://api.example.com/graphql"
        );
    }

    #[test]
    fn test_validation() {
        let config = ClientConfig::new("https://api.example.com/graphql");
        assert!(config.validate().is_ok());

        let with_token = config.clone().with_bearer_token("token");
        assert!(with_token.validate().is_ok());

        let empty_token = config.with_bearer_token("");
        assert!(matches!(empty_token.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_invalid_url() {
        let config = ClientConfig::new("http://[::1");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Url(url::ParseError::InvalidIpv6Address)));

        let err = ClientConfig::new("https://").validate().unwrap_err();
        assert!(matches!(err, Error::Url(url::ParseError::EmptyHost)));
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let config = ClientConfig::new("ftp://example.com/graphql");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-test"),
            HeaderValue::from_static("value"),
        );

        let config = ClientConfig::new("https://api.example.com/graphql")
            .with_bearer_token("token")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("graphql-bind-test")
            .with_ssl_verification(false)
            .with_headers(headers.clone())
            .with_header(
                HeaderName::from_static("x-other"),
                HeaderValue::from_static("other"),
            );

        assert_eq!(config.token.as_deref(), Some("token"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "graphql-bind-test");
        assert!(!config.verify_ssl);
        assert_eq!(config.extra_headers.get("x-test").unwrap(), "value");
        assert_eq!(config.extra_headers.get("x-other").unwrap(), "other");
        assert_eq!(config.extra_headers(), &config.extra_headers);
    }

    #[test]
    fn test_with_http_client() {
        let config = ClientConfig::new("https://api.example.com/graphql")
            .with_http_client(reqwest::Client::new());
        assert!(config.http_client.is_some());
        assert!(config.http_client_builder.is_none());

        let config = ClientConfig::new("https://api.example.com/graphql")
            .with_http_client_builder(|b| b.connection_verbose(true));
        assert!(config.http_client.is_none());
        assert!(config.http_client_builder.is_some());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("https://api.example.com/graphql").with_bearer_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("http_client: false"));
    }
}
