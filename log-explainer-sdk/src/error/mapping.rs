//! Error mapping for explainer API responses
//!
//! This module converts non-success HTTP responses and stream `error` event
//! payloads to the normalized ServiceError type.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ErrorDetail, ServiceError};

/// Map an HTTP error response to a ServiceError carrying status and detail
pub fn map_http_error(status: StatusCode, body: &str, context: ErrorContext) -> ServiceError {
    let detail = ErrorDetail::from_body(body);

    let message = match detail.text() {
        text if text.is_empty() => status.to_string(),
        text if text.chars().count() > 200 => {
            let truncated: String = text.chars().take(200).collect();
            format!("{}: {}...", status, truncated)
        }
        text => format!("{}: {}", status, text),
    };

    let error = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::validation(message)
        }
        _ => ServiceError::http(message),
    };

    error.with_context(context.status_code(status.as_u16()).detail(detail))
}

/// Map the payload of a stream `error` event to a ServiceError.
///
/// The payload may carry a numeric `status` or `status_code` which is kept
/// for classification.
pub fn map_stream_error(payload: &Value, context: ErrorContext) -> ServiceError {
    let detail = ErrorDetail::from_value(payload);
    let status = payload
        .get("status")
        .or_else(|| payload.get("status_code"))
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok());

    let mut context = context.detail(detail.clone());
    if let Some(code) = status {
        context = context.status_code(code);
    }

    let text = detail.text();
    let message = if text.is_empty() {
        "Server reported an error".to_string()
    } else {
        text
    };

    ServiceError::stream(message).with_context(context)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        402 => "billing",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}
