//! # Log Explainer SDK
//!
//! Client-side building blocks for the AI log explainer API.
//!
//! This crate provides:
//!
//! - A request/stream client that prefers the event-stream transport and
//!   falls back to the single-shot transport
//! - An incremental event-stream decoder that is independent of networking
//! - An error classifier producing user-facing title/message/suggestions
//! - Session state that folds stream events into displayable state
//! - A best-effort secret redaction filter
//! - Pretty/raw rendering and JSON/Markdown export of analysis results
//!
//! ## Architecture
//!
//! - `ExplainerClient`: talks to `POST /explain/stream` and `POST /explain`
//! - `EventStreamDecoder`: turns arbitrary byte chunks into `StreamEvent`s
//! - `AnalysisSession`: the state a front end renders
//! - `classify`: maps failures to a `ClassifiedError`
//! - `ServiceError`: error type shared by the whole crate

// Re-export core modules
pub mod core;
pub use core::{ClientBuilder, NoopObserver, ServiceClient, SessionObserver};

// Service client
pub mod services;
pub use services::explainer::{
    AnalysisOutcome, AnalysisRequest, AnalysisResult, AnalyzeOptions, ExplainerClient,
    ParsedExplanation, Task, TransportKind,
};

// Re-export error handling
pub mod error;
pub use error::classify::{classify, classify_service_error, ClassifiedError, ErrorSource};
pub use error::{ErrorContext, ErrorDetail, Result, ServiceError};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ExplainerConfig, ServiceConfig};

pub mod stream;
pub use stream::{EventStreamDecoder, StreamEvent};

pub mod session;
pub use session::{AnalysisSession, SessionUpdate};

pub mod capture;
pub use capture::CaptureSurface;

pub mod export;
pub mod redact;
pub mod render;

// Utility module for common functionality
pub mod util;

#[cfg(test)]
mod tests;

/// Create a new default client builder
pub fn client() -> core::ClientBuilder {
    core::ClientBuilder::new()
}

/// Create a client configured from the `LOG_EXPLAINER_*` environment
pub fn client_from_env() -> Result<ExplainerClient> {
    let config = ExplainerConfig::from_provider(&**config::DEFAULT_PROVIDER)?;
    core::ClientBuilder::from_config(&config).build()
}
