//! Failure classification
//!
//! Turns a failed analysis (HTTP status, detail payload, transport failure)
//! into the title/message/suggestions triple shown to the user. The table is
//! evaluated top to bottom and the first matching row wins.

use serde::Serialize;

use super::{ErrorDetail, ServiceError};

pub const TITLE_AUTHENTICATION: &str = "Authentication error";
pub const TITLE_BILLING: &str = "Billing required or quota exceeded";
pub const TITLE_RATE_LIMITED: &str = "Rate limited";
pub const TITLE_UNREACHABLE: &str = "Cannot reach backend";
pub const TITLE_SERVER: &str = "Server error";
pub const TITLE_UNEXPECTED: &str = "Unexpected error";

/// Where a failure was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// No response was received at all
    Network,
    /// The server answered with an error status
    Http,
    /// The server emitted an `error` event on the stream
    Stream,
}

/// A failure ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub title: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl ClassifiedError {
    fn new(title: &str, message: impl Into<String>, suggestions: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn mentions(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// Classify a failure from its status, detail payload and source
pub fn classify(
    status: Option<u16>,
    detail: &ErrorDetail,
    source: Option<ErrorSource>,
) -> ClassifiedError {
    let text = detail.text();
    let lower = text.to_lowercase();

    if matches!(status, Some(401) | Some(403)) || mentions(&lower, &["unauthorized", "forbidden"]) {
        return ClassifiedError::new(
            TITLE_AUTHENTICATION,
            "The backend rejected the request credentials.",
            &[
                "Check that the backend's AI provider API key is set and valid",
                "Restart the backend after changing its environment",
                "Verify the account has access to the configured model",
            ],
        );
    }

    if status == Some(402) || mentions(&lower, &["payment", "billing", "quota", "insufficient"]) {
        return ClassifiedError::new(
            TITLE_BILLING,
            "The AI provider requires payment or the usage quota is exhausted.",
            &[
                "Add credits or a payment method to the provider account",
                "Switch the backend to a free model",
                "Try again after the quota resets",
            ],
        );
    }

    if status == Some(429) || mentions(&lower, &["rate limit", "rate-limit", "ratelimit"]) {
        return ClassifiedError::new(
            TITLE_RATE_LIMITED,
            "Too many requests were sent to the AI provider.",
            &[
                "Wait a minute and retry",
                "Avoid running several analyses at once",
                "Use a model with a higher rate limit",
            ],
        );
    }

    if status.is_none() && source == Some(ErrorSource::Network) {
        return ClassifiedError::new(
            TITLE_UNREACHABLE,
            "The server did not respond. Please check if it is running.",
            &[
                "Start the backend and try again",
                "Check that LOG_EXPLAINER_API_URL points at the backend",
                "Check proxy, VPN or firewall settings",
            ],
        );
    }

    if status.map_or(false, |code| code >= 500) || mentions(&lower, &["server error", "bad gateway"])
    {
        return ClassifiedError::new(
            TITLE_SERVER,
            "The backend failed while processing the log.",
            &[
                "Retry the analysis",
                "Check the backend logs for details",
                "Try a shorter log excerpt",
            ],
        );
    }

    let message = if text.trim().is_empty() {
        "An unexpected error occurred.".to_string()
    } else {
        text
    };

    ClassifiedError::new(
        TITLE_UNEXPECTED,
        message,
        &[
            "Retry the analysis",
            "If the problem persists, check the backend logs",
        ],
    )
}

/// Classify a `ServiceError` produced by the client
pub fn classify_service_error(error: &ServiceError) -> ClassifiedError {
    let source = if error.is_transport_failure() {
        ErrorSource::Network
    } else if matches!(error.root(), ServiceError::Stream(_)) {
        ErrorSource::Stream
    } else {
        ErrorSource::Http
    };

    let detail = match error.detail() {
        Some(detail) => detail.clone(),
        None if source == ErrorSource::Network => ErrorDetail::Absent,
        None => ErrorDetail::Text(error.root().to_string()),
    };

    classify(error.status_code(), &detail, Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_match_wins() {
        // 429 status but detail mentions "unauthorized": auth row comes first
        let detail = ErrorDetail::from(json!({"detail": "Unauthorized key"}));
        assert_eq!(classify(Some(429), &detail, None).title, TITLE_AUTHENTICATION);
    }

    #[test]
    fn test_unexpected_uses_detail_text() {
        let detail = ErrorDetail::from(json!({"detail": "raw_log cannot be empty"}));
        let classified = classify(Some(400), &detail, Some(ErrorSource::Http));
        assert_eq!(classified.title, TITLE_UNEXPECTED);
        assert_eq!(classified.message, "raw_log cannot be empty");
    }
}
