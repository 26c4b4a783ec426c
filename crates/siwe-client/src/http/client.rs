/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client with a cookie jar for the server session
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};

use crate::http::{AuthError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the authentication server
///
/// The server session is an opaque cookie set by `/verify`, so the client
/// keeps a cookie jar and sends it with every request.
#[derive(Debug)]
pub struct SiweApiClient {
    http_client: Client,
    base_url: Url,
}

impl SiweApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig::default(), base_url)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Base URL of the authentication server
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Build request builder for an endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SiweApiClient::new("https://auth.app.test").unwrap();
        assert_eq!(client.base_url().as_str(), "https://auth.app.test/");
    }

    #[test]
    fn test_client_with_config() {
        let config = ClientConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        };
        let client = SiweApiClient::with_config(config, "https://auth.app.test");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = SiweApiClient::new("not a url").unwrap_err();
        assert!(matches!(err, AuthError::UrlParse(_)));
    }
}
