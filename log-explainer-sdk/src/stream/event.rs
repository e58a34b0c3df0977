//! Typed stream events

use serde_json::Value;

use super::RawEvent;
use crate::error::{Result, ServiceError};
use crate::services::explainer::AnalysisResult;

/// An event emitted by `/explain/stream`
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Progress report; either field may be missing
    Status {
        step: Option<u32>,
        message: Option<String>,
    },

    /// Incremental fragment of the model output
    Chunk { content: String },

    /// The complete result; ends the stream
    Final(AnalysisResult),

    /// Server-side failure; ends the stream
    Error(Value),
}

impl StreamEvent {
    /// Interpret a raw event.
    ///
    /// Returns `Ok(None)` for event names this client does not handle and an
    /// error when the payload is not valid JSON of the expected shape.
    pub fn decode(raw: &RawEvent) -> Result<Option<StreamEvent>> {
        let name = match raw.event.as_deref() {
            Some(name) => name.trim(),
            None => return Ok(None),
        };

        if !matches!(name, "status" | "chunk" | "final" | "error") {
            log::debug!("Ignoring stream event of unknown type: {}", name);
            return Ok(None);
        }

        let payload: Value = serde_json::from_str(&raw.data).map_err(|e| {
            ServiceError::parsing(format!("Invalid JSON in '{}' event: {}", name, e))
        })?;

        let event = match name {
            "status" => StreamEvent::Status {
                step: payload
                    .get("step")
                    .and_then(Value::as_f64)
                    .filter(|step| *step >= 0.0)
                    .map(|step| step as u32),
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "chunk" => {
                let content = payload
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ServiceError::parsing("'chunk' event without content"))?;
                StreamEvent::Chunk {
                    content: content.to_string(),
                }
            }
            "final" => StreamEvent::Final(serde_json::from_value(payload)?),
            _ => StreamEvent::Error(payload),
        };

        Ok(Some(event))
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Final(_) | StreamEvent::Error(_))
    }
}
