//! Client builder implementation
//!
//! Provides the builder used to create and configure explainer clients.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::{ExplainerConfig, ServiceConfig, DEFAULT_BASE_URL};
use crate::error::Result;
use crate::services::common::build_http_client;
use crate::services::explainer::ExplainerClient;
use crate::services::UserAgent;

/// Default bound on establishing a connection
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for `ExplainerClient`
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    /// Base URL for the service
    base_url: Option<String>,

    /// Custom headers to include with all requests
    custom_headers: HashMap<String, String>,

    /// Connect timeout
    connect_timeout: Option<Duration>,

    /// User agent
    user_agent: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            custom_headers: HashMap::new(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            user_agent: None,
        }
    }
}

impl ClientBuilder {
    /// Create a new client builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration
    pub fn from_config(config: &ExplainerConfig) -> Self {
        Self::new()
            .base_url(config.base_url.clone())
            .user_agent(config.user_agent.clone())
    }

    /// Set the base URL for the service
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Add a custom header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    /// Set the connect timeout; `None` leaves it to the OS
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ExplainerClient> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let config = ExplainerConfig {
            base_url: base_url.clone(),
            ..ExplainerConfig::default()
        };
        config.validate()?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| UserAgent::default().to_string());

        let headers: Vec<(String, String)> = self.custom_headers.into_iter().collect();
        let http_client = build_http_client(&user_agent, self.connect_timeout, &headers)?;

        Ok(ExplainerClient::new(http_client, base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    #[test]
    fn test_build_trims_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:9000/")
            .build()
            .unwrap();
        assert_eq!(client.endpoint("explain"), "http://localhost:9000/explain");
    }

    #[test]
    fn test_build_rejects_unsupported_scheme() {
        let result = ClientBuilder::new().base_url("ftp://example.com").build();
        assert!(matches!(result, Err(ServiceError::Configuration(_))));
    }
}
