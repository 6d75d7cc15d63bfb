//! HTTP client with connection pooling
//!
//! Requests are sent once. A failed fetch is reported to the caller, which
//! records it and moves on; rerunning the whole pipeline is the retry.

use portpatch_config::NetworkConfig;
use portpatch_errors::{Error, NetworkError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: format!("portpatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        let defaults = Self::default();
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            user_agent: config.user_agent.clone().unwrap_or(defaults.user_agent),
            ..defaults
        }
    }
}

/// HTTP client wrapper
#[derive(Clone)]
pub struct NetClient {
    client: Client,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: &NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&NetConfig::default())
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, connection failures or when the server
    /// rate-limits the request.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.get_with_headers(url, &[]).await
    }

    /// Execute a GET request with extra headers
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, connection failures or when the server
    /// rate-limits the request.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, Error> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| convert_error(&e, url))?;
        check_rate_limit(&response)?;
        Ok(response)
    }
}

fn convert_error(error: &reqwest::Error, url: &str) -> Error {
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
        .into()
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string()).into()
    } else {
        NetworkError::DownloadFailed(error.to_string()).into()
    }
}

fn check_rate_limit(response: &Response) -> Result<(), Error> {
    let status = response.status();
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::FORBIDDEN {
        return Ok(());
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");

    match retry_after {
        Some(seconds) => Err(NetworkError::RateLimited { seconds }.into()),
        None if exhausted || status == StatusCode::TOO_MANY_REQUESTS => {
            Err(NetworkError::RateLimited { seconds: 60 }.into())
        }
        None => Ok(()),
    }
}
