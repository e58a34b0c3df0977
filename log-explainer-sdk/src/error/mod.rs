//! Error handling for the log explainer client
//!
//! This module provides the error system used across the crate:
//! - Categorizes failures by kind (network, timeout, HTTP status, parsing, etc.)
//! - Carries the HTTP status and the normalized `detail` payload as context
//! - Maps raw HTTP error responses to `ServiceError` (see `mapping`)
//! - Classifies failures into user-facing messages (see `classify`)

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub mod classify;
pub mod mapping;

/// Result type for log explainer operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the log explainer client
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never produced a response (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The overall deadline for an analysis expired
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The caller cancelled the in-flight analysis
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// The server answered with a non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server reported an error through the event stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Unexpected or internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

impl ServiceError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::Network(message.into())
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    /// Create a cancellation error
    pub fn cancelled(message: impl Into<String>) -> Self {
        ServiceError::Cancelled(message.into())
    }

    /// Create an HTTP status error
    pub fn http(message: impl Into<String>) -> Self {
        ServiceError::Http(message.into())
    }

    /// Create a parsing error
    pub fn parsing(message: impl Into<String>) -> Self {
        ServiceError::Parsing(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Create a stream error
    pub fn stream(message: impl Into<String>) -> Self {
        ServiceError::Stream(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// The error with all context layers removed
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Get the service name if available
    pub fn service_name(&self) -> Option<&str> {
        match self {
            ServiceError::WithContext { context, .. } => Some(&context.service),
            _ => None,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::WithContext { context, inner } => {
                context.status_code.or_else(|| inner.status_code())
            }
            _ => None,
        }
    }

    /// Get the normalized detail payload if available
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            ServiceError::WithContext { context, inner } => {
                context.detail.as_ref().or_else(|| inner.detail())
            }
            _ => None,
        }
    }

    /// Whether no response was received at all (network failure or timeout)
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self.root(),
            ServiceError::Network(_) | ServiceError::Timeout(_)
        )
    }

    /// Whether the caller cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), ServiceError::Cancelled(_))
    }
}

/// Normalized shape of an error `detail` payload.
///
/// Servers report failures as a bare string, an object with a `message`
/// field, an object with a `detail` field, or something else entirely. The
/// classifier only ever sees this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    /// A plain string payload
    Text(String),

    /// `{ "message": ... }`
    Message(String),

    /// `{ "detail": ... }`
    Detail(String),

    /// Any other JSON value
    Other(Value),

    /// No payload at all
    Absent,
}

impl ErrorDetail {
    /// Normalize an already-decoded JSON payload
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => ErrorDetail::Absent,
            Value::String(text) => ErrorDetail::Text(text.clone()),
            Value::Object(map) => {
                if let Some(message) = map.get("message").filter(|v| !v.is_null()) {
                    ErrorDetail::Message(value_text(message))
                } else if let Some(detail) = map.get("detail").filter(|v| !v.is_null()) {
                    ErrorDetail::Detail(value_text(detail))
                } else {
                    ErrorDetail::Other(value.clone())
                }
            }
            other => ErrorDetail::Other(other.clone()),
        }
    }

    /// Normalize a raw response body (JSON or free text)
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return ErrorDetail::Absent;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorDetail::Text(body.to_string()),
        }
    }

    /// The text used for matching and display; empty when absent
    pub fn text(&self) -> String {
        match self {
            ErrorDetail::Text(text) | ErrorDetail::Message(text) | ErrorDetail::Detail(text) => {
                text.clone()
            }
            ErrorDetail::Other(value) => value.to_string(),
            ErrorDetail::Absent => String::new(),
        }
    }

    /// Check whether any payload was present
    pub fn is_absent(&self) -> bool {
        matches!(self, ErrorDetail::Absent)
    }
}

impl From<&str> for ErrorDetail {
    fn from(text: &str) -> Self {
        ErrorDetail::Text(text.to_string())
    }
}

impl From<Value> for ErrorDetail {
    fn from(value: Value) -> Self {
        ErrorDetail::from_value(&value)
    }
}

impl From<Option<Value>> for ErrorDetail {
    fn from(value: Option<Value>) -> Self {
        value.map(ErrorDetail::from).unwrap_or(ErrorDetail::Absent)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("message").and_then(|m| m.as_str()) {
            Some(message) => message.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// When the failure was observed
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Normalized error payload
    pub detail: Option<ErrorDetail>,

    /// Request ID for tracing
    pub request_id: Option<String>,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            detail: None,
            request_id: None,
            endpoint: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add the normalized error payload
    pub fn detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::for_service("http_client");

        let service_error = if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ServiceError::network(format!("Connection error: {}", err))
        } else if err.is_request() {
            ServiceError::network(format!("Request failed: {}", err))
        } else if err.is_redirect() {
            ServiceError::network(format!("Too many redirects: {}", err))
        } else if err.is_decode() {
            ServiceError::parsing(format!("Response decode error: {}", err))
        } else if err.is_body() {
            ServiceError::network(format!("Response body error: {}", err))
        } else {
            ServiceError::internal(format!("HTTP client error: {}", err))
        };

        // Add status code if available
        if let Some(status) = err.status() {
            service_error.with_context(context.status_code(status.as_u16()))
        } else {
            service_error.with_context(context)
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}
