//! Common utilities for service clients
//!
//! This module provides shared HTTP functionality for the explainer client.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;

use crate::error::mapping::{classify_http_error, map_http_error};
use crate::error::{ErrorContext, Result, ServiceError};

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// UserAgent structure for identifying the client to the backend
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "log-explainer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("sdk".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build the HTTP client used by the explainer client.
///
/// Only the connect phase is bounded here. The overall analysis deadline is
/// enforced by the caller so it also covers a long-lived stream body.
pub fn build_http_client(
    user_agent: &str,
    connect_timeout: Option<Duration>,
    extra_headers: &[(String, String)],
) -> Result<Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    for (key, value) in extra_headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ServiceError::configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ServiceError::configuration(format!("Invalid header value: {}", e)))?;
        headers.insert(name, value);
    }

    let mut builder = Client::builder().default_headers(headers).gzip(true);
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Create error context for an explainer request
pub fn create_error_context(endpoint: &str, request_id: &str) -> ErrorContext {
    ErrorContext::for_service("explainer")
        .endpoint(endpoint)
        .request_id(request_id)
}

/// Turn a non-success response into a ServiceError carrying status and detail
pub async fn parse_error_response(response: reqwest::Response, context: ErrorContext) -> ServiceError {
    let status = response.status();
    log::debug!(
        "{} returned {} ({})",
        context.endpoint.as_deref().unwrap_or("request"),
        status,
        classify_http_error(status)
    );

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            log::debug!("Failed to read error response body: {}", e);
            String::new()
        }
    };

    map_http_error(status, &body, context)
}
