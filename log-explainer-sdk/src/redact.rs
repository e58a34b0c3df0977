//! Best-effort secret redaction
//!
//! Masks credential-shaped substrings before a log leaves the machine.
//! Passes run in a fixed order over the evolving text, so later passes see
//! the output of earlier ones. False negatives are expected; input is never
//! rejected.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder for a bearer token
pub const BEARER_PLACEHOLDER: &str = "Bearer [REDACTED]";

/// Placeholder for a JWT
pub const JWT_PLACEHOLDER: &str = "[REDACTED_JWT]";

/// Placeholder for a long hexadecimal run
pub const HEX_PLACEHOLDER: &str = "[REDACTED_HEX]";

/// Placeholder for an email address
pub const EMAIL_PLACEHOLDER: &str = "[REDACTED_EMAIL]";

/// Value written in place of a credential assignment
pub const MASK: &str = "***";

struct Pass {
    pattern: Regex,
    replacement: &'static str,
}

fn pass(pattern: &str, replacement: &'static str) -> Option<Pass> {
    match Regex::new(pattern) {
        Ok(pattern) => Some(Pass {
            pattern,
            replacement,
        }),
        Err(e) => {
            log::error!("Invalid redaction pattern {}: {}", pattern, e);
            None
        }
    }
}

static PASSES: Lazy<Vec<Pass>> = Lazy::new(|| {
    [
        // Surrounding quotes are preserved
        pass(
            r#"(?i)\b([a-z0-9_\-]*(?:key|secret|token|password|pwd))(["']?)\s*[:=]\s*(["']?)(?:bearer\s+)?[^\s"',;&]+(["']?)"#,
            "${1}${2}: ${3}***${4}",
        ),
        pass(r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*", BEARER_PLACEHOLDER),
        pass(
            r"\b[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b",
            JWT_PLACEHOLDER,
        ),
        pass(r"\b[0-9a-fA-F]{32,}\b", HEX_PLACEHOLDER),
        pass(
            r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b",
            EMAIL_PLACEHOLDER,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Mask secrets in `text`
pub fn redact(text: &str) -> String {
    PASSES.iter().fold(text.to_string(), |current, pass| {
        pass.pattern
            .replace_all(&current, pass.replacement)
            .into_owned()
    })
}

/// Whether `redact` would change `text`
pub fn contains_secrets(text: &str) -> bool {
    PASSES.iter().any(|pass| pass.pattern.is_match(text))
}
