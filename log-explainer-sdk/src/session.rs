//! Analysis session state
//!
//! `AnalysisSession` is everything a front end renders while an analysis is
//! running: loading/streaming flags, the progress step and message, the
//! append-only partial output, and finally a result or a classified error.
//! Stream events are folded into it one at a time and never retained.

use std::time::{Duration, Instant};

use crate::error::classify::{classify_service_error, ClassifiedError};
use crate::error::mapping::map_stream_error;
use crate::error::ErrorContext;
use crate::services::explainer::{AnalysisResult, TransportKind};
use crate::stream::StreamEvent;

/// Messages rotated while no server progress message is available
pub const LOADING_MESSAGES: [&str; 5] = [
    "Processing your log...",
    "Analyzing log patterns...",
    "Consulting AI model...",
    "Generating explanation...",
    "Almost ready...",
];

/// How long each rotating loading message stays up
pub const LOADING_MESSAGE_INTERVAL: Duration = Duration::from_secs(8);

/// Step labels shown by the progress stepper
pub const ANALYSIS_STEPS: [&str; 4] = [
    "Reading log",
    "Analyzing patterns",
    "Consulting model",
    "Formatting result",
];

/// A change a front end may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// A transport attempt started
    Started { transport: TransportKind },
    /// The stream could not be used; retrying with the single-shot transport
    FallingBack,
    /// Progress step and message after a status event
    Progress { step: u32, message: Option<String> },
    /// A fragment was appended to the partial output
    Partial { fragment: String },
    /// A result is available
    Completed,
    /// The analysis failed
    Failed(ClassifiedError),
    /// The analysis was cancelled
    Cancelled,
}

/// State of the current analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    loading: bool,
    streaming: bool,
    cancelled: bool,
    step: u32,
    message: Option<String>,
    partial: String,
    result: Option<AnalysisResult>,
    error: Option<ClassifiedError>,
    transport: Option<TransportKind>,
    started_at: Option<Instant>,
}

impl AnalysisSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all prior state and mark a new analysis as loading
    pub fn begin(&mut self) {
        *self = Self {
            loading: true,
            started_at: Some(Instant::now()),
            ..Self::default()
        };
    }

    /// Record that a transport attempt started
    pub fn start_transport(&mut self, transport: TransportKind) -> SessionUpdate {
        self.transport = Some(transport);
        self.streaming = transport == TransportKind::Stream;
        SessionUpdate::Started { transport }
    }

    /// Record that the stream transport was abandoned for the single-shot one
    pub fn fall_back(&mut self) -> SessionUpdate {
        self.streaming = false;
        SessionUpdate::FallingBack
    }

    /// Fold one stream event into the session.
    ///
    /// Events arriving after the session reached a terminal state are ignored.
    pub fn apply(&mut self, event: StreamEvent) -> Option<SessionUpdate> {
        if self.is_finished() {
            return None;
        }

        match event {
            StreamEvent::Status { step, message } => {
                if let Some(step) = step {
                    self.step = step;
                }
                if message.is_some() {
                    self.message = message;
                }
                Some(SessionUpdate::Progress {
                    step: self.step,
                    message: self.message.clone(),
                })
            }
            StreamEvent::Chunk { content } => {
                self.partial.push_str(&content);
                Some(SessionUpdate::Partial { fragment: content })
            }
            StreamEvent::Final(result) => Some(self.complete(result)),
            StreamEvent::Error(payload) => {
                let error = map_stream_error(&payload, ErrorContext::for_service("explainer"));
                Some(self.fail(classify_service_error(&error)))
            }
        }
    }

    /// Store the final result and end loading
    pub fn complete(&mut self, result: AnalysisResult) -> SessionUpdate {
        self.result = Some(result);
        self.loading = false;
        self.streaming = false;
        SessionUpdate::Completed
    }

    /// Store a classified failure and end loading
    pub fn fail(&mut self, error: ClassifiedError) -> SessionUpdate {
        self.error = Some(error.clone());
        self.loading = false;
        self.streaming = false;
        SessionUpdate::Failed(error)
    }

    /// Mark the analysis as cancelled; partial output is kept
    pub fn cancel(&mut self) -> SessionUpdate {
        self.cancelled = true;
        self.loading = false;
        self.streaming = false;
        SessionUpdate::Cancelled
    }

    /// Whether a result, an error or a cancellation ended the session
    pub fn is_finished(&self) -> bool {
        self.result.is_some() || self.error.is_some() || self.cancelled
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Last step reported by the server (0 before any status event)
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Last progress message reported by the server
    pub fn progress_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Text received through chunk events so far
    pub fn partial_output(&self) -> &str {
        &self.partial
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        self.error.as_ref()
    }

    /// Transport of the most recent attempt
    pub fn transport(&self) -> Option<TransportKind> {
        self.transport
    }

    /// Message to show while loading: the server's, else a rotating one
    pub fn loading_message(&self, now: Instant) -> &str {
        if let Some(message) = self.progress_message() {
            return message;
        }

        let elapsed = self
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        rotating_message(elapsed)
    }
}

/// Rotating loading message for the given elapsed time
pub fn rotating_message(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_secs() / LOADING_MESSAGE_INTERVAL.as_secs()) as usize;
    LOADING_MESSAGES[index % LOADING_MESSAGES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotating_message() {
        assert_eq!(rotating_message(Duration::from_secs(0)), "Processing your log...");
        assert_eq!(rotating_message(Duration::from_secs(9)), "Analyzing log patterns...");
        assert_eq!(rotating_message(Duration::from_secs(40)), "Processing your log...");
    }

    #[test]
    fn test_server_message_wins_over_rotation() {
        let mut session = AnalysisSession::new();
        session.begin();
        session.apply(StreamEvent::Status {
            step: Some(2),
            message: Some("Calling model".to_string()),
        });
        assert_eq!(session.loading_message(Instant::now()), "Calling model");
    }
}
