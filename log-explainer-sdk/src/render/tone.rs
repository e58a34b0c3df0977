//! Display tones for free-form severity and priority strings

use serde::Serialize;

/// Visual tone of a severity badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTone {
    Danger,
    Warning,
    Success,
    Neutral,
}

impl SeverityTone {
    /// Normalize a free-form severity; unknown values are neutral
    pub fn from_severity(severity: &str) -> Self {
        match severity.trim().to_lowercase().as_str() {
            "critical" | "high" | "error" => SeverityTone::Danger,
            "medium" | "warning" | "warn" => SeverityTone::Warning,
            "low" | "info" | "informational" => SeverityTone::Success,
            _ => SeverityTone::Neutral,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SeverityTone::Danger => "🔴",
            SeverityTone::Warning => "🟡",
            SeverityTone::Success => "🟢",
            SeverityTone::Neutral => "⚪",
        }
    }

    /// Badge text: icon followed by the severity as given
    pub fn badge(severity: &str) -> String {
        format!("{} {}", Self::from_severity(severity).icon(), severity.trim())
    }
}

/// Priority class of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTone {
    High,
    Medium,
    Low,
    Other,
}

impl PriorityTone {
    /// Case-insensitive; anything but high/medium/low is `Other`
    pub fn from_priority(priority: Option<&str>) -> Self {
        match priority.map(|p| p.trim().to_lowercase()).as_deref() {
            Some("high") => PriorityTone::High,
            Some("medium") => PriorityTone::Medium,
            Some("low") => PriorityTone::Low,
            _ => PriorityTone::Other,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PriorityTone::High => "🔥",
            PriorityTone::Medium => "⚡",
            PriorityTone::Low => "✅",
            PriorityTone::Other => "📄",
        }
    }
}
