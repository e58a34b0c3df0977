//! Explainer API data models
//!
//! This module contains type definitions for the explainer API request and
//! response bodies. Response models are lenient: model output is free-form,
//! so list fields accept a bare string and the confidence score accepts a
//! numeric string. Unknown fields of `parsed` are preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for `/explain` and `/explain/stream`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AnalysisRequest {
    /// Log text as captured (and possibly redacted)
    pub raw_log: String,

    /// Free-form context, empty when not provided
    #[serde(default)]
    pub context: String,
}

impl AnalysisRequest {
    /// Create a new request
    pub fn new(raw_log: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            raw_log: raw_log.into(),
            context: context.into(),
        }
    }

    /// Whether there is anything to analyze
    pub fn is_blank(&self) -> bool {
        self.raw_log.trim().is_empty()
    }

    /// Copy of this request with secrets masked in both fields
    pub fn redacted(&self) -> Self {
        Self {
            raw_log: crate::redact::redact(&self.raw_log),
            context: crate::redact::redact(&self.context),
        }
    }
}

/// Response body of `/explain`, also carried by the stream `final` event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisResult {
    /// The model's raw text output
    #[serde(
        rename = "raw_llm",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub raw_text: Option<String>,

    /// Structured explanation, absent when the output could not be parsed
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_parsed"
    )]
    pub parsed: Option<ParsedExplanation>,
}

impl AnalysisResult {
    /// Build a result that only carries raw text
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(text.into()),
            parsed: None,
        }
    }

    /// Raw text, if present and not empty
    pub fn raw_text(&self) -> Option<&str> {
        non_empty(&self.raw_text)
    }
}

/// Response body of `/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Structured explanation produced by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParsedExplanation {
    /// One-sentence summary
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub summary: Option<String>,

    /// Probable root cause
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub root_cause: Option<String>,

    /// Free-form severity (low/medium/high/critical are the usual values)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub severity: Option<String>,

    /// Ranked list of probable fixes
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string_list")]
    pub probable_fixes: Option<Vec<String>>,

    /// Ordered reproduction checklist
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string_list")]
    pub reproduction_steps: Option<Vec<String>>,

    /// Tests to validate a fix
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string_list")]
    pub follow_up_tests: Option<Vec<String>>,

    /// Confidence in the explanation, nominally 0-100
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_score")]
    pub confidence_score: Option<f64>,

    /// Additional notes
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub notes: Option<String>,

    /// Follow-up tasks
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_tasks")]
    pub tasks: Option<Vec<Task>>,

    /// Fields the client does not know about, kept for JSON export
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParsedExplanation {
    pub fn summary(&self) -> Option<&str> {
        non_empty(&self.summary)
    }

    pub fn root_cause(&self) -> Option<&str> {
        non_empty(&self.root_cause)
    }

    pub fn severity(&self) -> Option<&str> {
        non_empty(&self.severity)
    }

    pub fn notes(&self) -> Option<&str> {
        non_empty(&self.notes)
    }

    pub fn probable_fixes(&self) -> Option<&[String]> {
        non_empty_list(&self.probable_fixes)
    }

    pub fn reproduction_steps(&self) -> Option<&[String]> {
        non_empty_list(&self.reproduction_steps)
    }

    pub fn follow_up_tests(&self) -> Option<&[String]> {
        non_empty_list(&self.follow_up_tests)
    }

    pub fn tasks(&self) -> Option<&[Task]> {
        non_empty_list(&self.tasks)
    }

    /// Confidence score clamped to [0, 100] for display
    pub fn confidence(&self) -> Option<f64> {
        self.confidence_score
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(0.0, 100.0))
    }
}

/// A follow-up task suggested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Task {
    /// Identifier, expected to be unique within a result
    #[serde(default)]
    pub id: String,

    /// Short title
    #[serde(default)]
    pub title: String,

    /// Longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form priority; high/medium/low are recognized for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl Task {
    pub fn description(&self) -> Option<&str> {
        non_empty(&self.description)
    }

    pub fn priority(&self) -> Option<&str> {
        non_empty(&self.priority)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn non_empty_list<T>(value: &Option<Vec<T>>) -> Option<&[T]> {
    value.as_deref().filter(|items| !items.is_empty())
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{ParsedExplanation, Task};

    fn text(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(text(&value))
    }

    pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => None,
            Value::Array(items) => Some(items.iter().filter_map(text).collect()),
            other => text(&other).map(|item| vec![item]),
        })
    }

    pub fn opt_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    fn task(value: &Value) -> Option<Task> {
        match value {
            Value::Object(map) => Some(Task {
                id: map.get("id").and_then(text).unwrap_or_default(),
                title: map
                    .get("title")
                    .or_else(|| map.get("name"))
                    .and_then(text)
                    .unwrap_or_default(),
                description: map.get("description").and_then(text),
                priority: map.get("priority").and_then(text),
            }),
            Value::String(title) => Some(Task {
                title: title.clone(),
                ..Task::default()
            }),
            _ => None,
        }
    }

    pub fn opt_tasks<'de, D>(deserializer: D) -> Result<Option<Vec<Task>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => Some(items.iter().filter_map(task).collect()),
            _ => None,
        })
    }

    pub fn opt_parsed<'de, D>(deserializer: D) -> Result<Option<ParsedExplanation>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Ok(None);
        }

        match serde_json::from_value::<ParsedExplanation>(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                log::warn!("Discarding unreadable structured explanation: {}", e);
                Ok(None)
            }
        }
    }
}
