//! Explainer API client implementation
//!
//! This module provides a client for the log explainer API. An analysis
//! first tries `POST /explain/stream` and folds its events into an
//! `AnalysisSession` as they arrive; if the stream cannot be opened or
//! yields nothing usable, the same request is sent once to `POST /explain`.

mod models;
pub use models::*;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::core::{ClientBuilder, ServiceClient, SessionObserver};
use crate::error::classify::{classify_service_error, ClassifiedError};
use crate::error::{Result, ServiceError};
use crate::services::common::{create_error_context, parse_error_response, REQUEST_ID_HEADER};
use crate::session::AnalysisSession;
use crate::stream::{EventStreamDecoder, StreamEvent};
use crate::util::{format_duration, generate_request_id, sanitize_for_logging, truncate_string};

/// Streaming analysis endpoint
pub const STREAM_ENDPOINT: &str = "explain/stream";

/// Single-shot analysis endpoint
pub const EXPLAIN_ENDPOINT: &str = "explain";

/// Liveness endpoint
pub const HEALTH_ENDPOINT: &str = "health";

/// Transport used for an analysis attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Server-sent event stream
    Stream,
    /// One request, one JSON response
    SingleShot,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stream => write!(f, "stream"),
            TransportKind::SingleShot => write!(f, "single-shot"),
        }
    }
}

/// Per-analysis options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Mask secrets in the log and context before sending
    pub redact: bool,

    /// Try the stream transport first
    pub prefer_stream: bool,

    /// Overall deadline covering both transports
    pub timeout: Option<Duration>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            redact: false,
            prefer_stream: true,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
        }
    }
}

/// How an analysis ended
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// A result is available
    Completed(AnalysisResult),
    /// The analysis failed
    Failed(ClassifiedError),
    /// The user cancelled; partial output stays in the session
    Cancelled,
    /// The log was empty and no request was made
    Skipped,
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            AnalysisOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed(_))
    }
}

/// How a stream attempt ended
enum StreamEnd {
    /// The session reached a terminal state
    Finished,
    /// Nothing usable arrived; the single-shot transport should be tried
    Unavailable(ServiceError),
}

/// Explainer API client
#[derive(Debug, Clone)]
pub struct ExplainerClient {
    /// HTTP client
    http_client: Client,

    /// Base URL without a trailing slash
    base_url: String,
}

impl ExplainerClient {
    /// Create a client from a prepared HTTP client
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a new builder for the explainer client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Full URL of an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Run one analysis to completion, failure or cancellation.
    ///
    /// A blank log returns `Skipped` without touching the session or the
    /// network. Otherwise the session is reset, every change is reported to
    /// `observer`, and the returned outcome mirrors the session's final state.
    /// Cancelling `cancel` or exceeding `options.timeout` drops the in-flight
    /// request and its response body.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        options: &AnalyzeOptions,
        session: &mut AnalysisSession,
        observer: &mut dyn SessionObserver,
        cancel: &CancellationToken,
    ) -> AnalysisOutcome {
        if request.is_blank() {
            debug!("Skipping analysis of an empty log");
            return AnalysisOutcome::Skipped;
        }

        let request = if options.redact {
            request.redacted()
        } else {
            request.clone()
        };

        session.begin();
        info!(
            "Analyzing log ({} chars, redact={})",
            request.raw_log.chars().count(),
            options.redact
        );
        debug!(
            "Log preview: {}",
            sanitize_for_logging(&truncate_string(&request.raw_log, 120))
        );

        let result = {
            let run = self.run(&request, options.prefer_stream, session, &mut *observer);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ServiceError::cancelled("Analysis cancelled")),
                error = deadline(options.timeout) => Err(error),
                result = run => result,
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if session.is_finished() => {
                debug!("Ignoring error after the session finished: {}", e);
            }
            Err(e) if e.is_cancelled() => {
                info!("Analysis cancelled");
                observer.on_update(&session.cancel());
            }
            Err(e) => {
                warn!("Analysis failed: {}", e);
                observer.on_update(&session.fail(classify_service_error(&e)));
            }
        }

        if !session.is_finished() {
            let error = ServiceError::internal("Analysis ended without a result");
            observer.on_update(&session.fail(classify_service_error(&error)));
        }

        outcome_of(session)
    }

    /// Submit a request over the single-shot transport
    pub async fn explain(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let endpoint = self.endpoint(EXPLAIN_ENDPOINT);
        let request_id = generate_request_id();
        let context = create_error_context(&endpoint, &request_id);
        debug!("POST {} ({})", endpoint, request_id);

        let response = self
            .http_client
            .post(&endpoint)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::from(e).with_context(context.clone()))?;

        if !response.status().is_success() {
            return Err(parse_error_response(response, context).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::from(e).with_context(context.clone()))?;

        serde_json::from_str(&body).map_err(|e| {
            ServiceError::parsing(format!("Invalid analysis response: {}", e)).with_context(context)
        })
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        prefer_stream: bool,
        session: &mut AnalysisSession,
        observer: &mut dyn SessionObserver,
    ) -> Result<()> {
        if prefer_stream {
            observer.on_update(&session.start_transport(TransportKind::Stream));

            match self.stream_into(request, session, observer).await? {
                StreamEnd::Finished => return Ok(()),
                StreamEnd::Unavailable(reason) => {
                    warn!("Streaming unavailable, falling back to a single request: {}", reason);
                    observer.on_update(&session.fall_back());
                }
            }
        }

        observer.on_update(&session.start_transport(TransportKind::SingleShot));
        let result = self.explain(request).await.map_err(|e| {
            if prefer_stream {
                e.with_context_value("phase", "fallback")
            } else {
                e
            }
        })?;
        observer.on_update(&session.complete(result));
        Ok(())
    }

    /// Read `/explain/stream` into the session.
    ///
    /// A transport failure after at least one event is an error of its own;
    /// before any event it only makes the stream unavailable.
    async fn stream_into(
        &self,
        request: &AnalysisRequest,
        session: &mut AnalysisSession,
        observer: &mut dyn SessionObserver,
    ) -> Result<StreamEnd> {
        let endpoint = self.endpoint(STREAM_ENDPOINT);
        let request_id = generate_request_id();
        let context = create_error_context(&endpoint, &request_id);
        debug!("Opening event stream {} ({})", endpoint, request_id);

        let response = match self
            .http_client
            .post(&endpoint)
            .header(ACCEPT, "text/event-stream")
            .header(REQUEST_ID_HEADER, &request_id)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(StreamEnd::Unavailable(
                    ServiceError::from(e).with_context(context),
                ))
            }
        };

        if !response.status().is_success() {
            return Ok(StreamEnd::Unavailable(
                parse_error_response(response, context).await,
            ));
        }

        let mut decoder = EventStreamDecoder::new();
        let mut received = false;
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let error = ServiceError::from(e).with_context(context.clone());
                    if received {
                        return Err(error);
                    }
                    return Ok(StreamEnd::Unavailable(error));
                }
            };

            let events = decoder.feed_events(&chunk);
            received |= !events.is_empty();
            if fold_events(events, session, observer) {
                return Ok(StreamEnd::Finished);
            }
        }

        if let Some(raw) = decoder.finish() {
            let events = crate::stream::decode_all(vec![raw]);
            if fold_events(events, session, observer) {
                return Ok(StreamEnd::Finished);
            }
        }

        if !session.partial_output().is_empty() {
            warn!("Stream ended without a final event, using the partial output");
            let result = AnalysisResult::from_raw(session.partial_output());
            observer.on_update(&session.complete(result));
            return Ok(StreamEnd::Finished);
        }

        Ok(StreamEnd::Unavailable(
            ServiceError::stream("Stream ended without a result").with_context(context),
        ))
    }
}

#[async_trait]
impl ServiceClient for ExplainerClient {
    fn name(&self) -> &str {
        "explainer"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn health_check(&self) -> Result<bool> {
        let endpoint = self.endpoint(HEALTH_ENDPOINT);
        let response = self.http_client.get(&endpoint).send().await?;

        if !response.status().is_success() {
            debug!("Health check returned {}", response.status());
            return Ok(false);
        }

        let health: HealthStatus = response.json().await?;
        Ok(health.is_ok())
    }
}

/// Apply events in order; returns true once the session is finished
fn fold_events(
    events: Vec<StreamEvent>,
    session: &mut AnalysisSession,
    observer: &mut dyn SessionObserver,
) -> bool {
    for event in events {
        if let Some(update) = session.apply(event) {
            observer.on_update(&update);
        }
        if session.is_finished() {
            return true;
        }
    }
    false
}

/// Resolves with a timeout error when the deadline passes; never resolves
/// without one
pub(crate) async fn deadline(timeout: Option<Duration>) -> ServiceError {
    match timeout {
        Some(limit) => {
            tokio::time::sleep(limit).await;
            ServiceError::timeout(format!("No result within {}", format_duration(limit)))
        }
        None => std::future::pending().await,
    }
}

fn outcome_of(session: &AnalysisSession) -> AnalysisOutcome {
    if let Some(result) = session.result() {
        AnalysisOutcome::Completed(result.clone())
    } else if let Some(error) = session.error() {
        AnalysisOutcome::Failed(error.clone())
    } else {
        AnalysisOutcome::Cancelled
    }
}
