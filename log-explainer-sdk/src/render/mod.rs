//! Result rendering
//!
//! Pure presentation over an `AnalysisResult`. The pretty view lists every
//! present field of the structured explanation in its own labelled section;
//! the raw view shows the structured data as JSON, or the raw model text
//! when nothing structured was returned. Switching views never refetches.

mod progress;
mod tasks;
mod tone;

pub use progress::{Meter, StepState, Stepper};
pub use tasks::{task_key, TaskListState, NO_DESCRIPTION, UNTITLED};
pub use tone::{PriorityTone, SeverityTone};

use serde::Serialize;

use crate::services::explainer::{AnalysisResult, ParsedExplanation};

/// Shown when a result has neither structured data nor raw text
pub const NO_EXPLANATION: &str = "No explanation available.";

/// Width of the confidence bar in the pretty view
const METER_WIDTH: usize = 20;

/// Which representation of a result is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Pretty,
    Raw,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Pretty => ViewMode::Raw,
            ViewMode::Raw => ViewMode::Pretty,
        }
    }
}

/// A copyable block of the rendered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    RootCause,
    ProbableFixes,
    Severity,
    ReproductionSteps,
    FollowUpTests,
    Confidence,
    Notes,
    Tasks,
    /// The model's raw text
    RawResponse,
    /// `parsed` as pretty JSON
    StructuredData,
}

impl Section {
    /// Sections of the pretty view, in display order
    pub const PRETTY_ORDER: [Section; 9] = [
        Section::Summary,
        Section::RootCause,
        Section::ProbableFixes,
        Section::Severity,
        Section::ReproductionSteps,
        Section::FollowUpTests,
        Section::Confidence,
        Section::Notes,
        Section::Tasks,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::RootCause => "Root Cause",
            Section::ProbableFixes => "Probable Fixes",
            Section::Severity => "Severity",
            Section::ReproductionSteps => "Reproduction Steps",
            Section::FollowUpTests => "Follow-up Tests",
            Section::Confidence => "Confidence Score",
            Section::Notes => "Notes",
            Section::Tasks => "Tasks",
            Section::RawResponse => "Raw AI Response",
            Section::StructuredData => "Structured Data",
        }
    }
}

/// Exact text a copy action for `section` puts on the clipboard.
///
/// `None` when the section has nothing to copy.
pub fn copy_text(result: &AnalysisResult, section: Section) -> Option<String> {
    match section {
        Section::RawResponse => result.raw_text().map(str::to_string),
        Section::StructuredData => result.parsed.as_ref().and_then(to_pretty_json),
        _ => {
            let parsed = result.parsed.as_ref()?;
            match section {
                Section::Summary => parsed.summary().map(str::to_string),
                Section::RootCause => parsed.root_cause().map(str::to_string),
                Section::Severity => parsed.severity().map(str::to_string),
                Section::Notes => parsed.notes().map(str::to_string),
                Section::ProbableFixes => parsed.probable_fixes().map(|items| items.join("\n")),
                Section::ReproductionSteps => {
                    parsed.reproduction_steps().map(|items| items.join("\n"))
                }
                Section::FollowUpTests => parsed.follow_up_tests().map(|items| items.join("\n")),
                Section::Confidence => parsed.confidence().map(|c| Meter::new(c).to_string()),
                Section::Tasks => parsed.tasks().and_then(to_pretty_json),
                Section::RawResponse | Section::StructuredData => None,
            }
        }
    }
}

/// Render a result in the given view mode
pub fn render(result: &AnalysisResult, mode: ViewMode) -> String {
    match mode {
        ViewMode::Pretty => render_pretty(result),
        ViewMode::Raw => render_raw(result),
    }
}

/// Structured data as JSON, else the raw text
pub fn render_raw(result: &AnalysisResult) -> String {
    result
        .parsed
        .as_ref()
        .and_then(to_pretty_json)
        .or_else(|| result.raw_text().map(str::to_string))
        .unwrap_or_else(|| NO_EXPLANATION.to_string())
}

/// Labelled sections for each present field, then technical details
pub fn render_pretty(result: &AnalysisResult) -> String {
    let parsed = match &result.parsed {
        Some(parsed) => parsed,
        None => {
            return result
                .raw_text()
                .unwrap_or(NO_EXPLANATION)
                .to_string()
        }
    };

    let mut blocks: Vec<String> = Section::PRETTY_ORDER
        .iter()
        .filter_map(|section| {
            section_body(parsed, *section).map(|body| format!("{}\n{}", heading(section.label()), body))
        })
        .collect();

    if blocks.is_empty() {
        blocks.push(result.raw_text().unwrap_or(NO_EXPLANATION).to_string());
    } else if let Some(raw) = result.raw_text() {
        blocks.push(format!("{}\n{}", heading(Section::RawResponse.label()), raw));
    }

    blocks.join("\n\n")
}

fn heading(label: &str) -> String {
    format!("== {} ==", label)
}

fn section_body(parsed: &ParsedExplanation, section: Section) -> Option<String> {
    match section {
        Section::Summary => parsed.summary().map(str::to_string),
        Section::RootCause => parsed.root_cause().map(str::to_string),
        Section::Severity => parsed.severity().map(SeverityTone::badge),
        Section::Notes => parsed.notes().map(str::to_string),
        Section::ProbableFixes => parsed.probable_fixes().map(bullets),
        Section::ReproductionSteps => parsed.reproduction_steps().map(numbered),
        Section::FollowUpTests => parsed.follow_up_tests().map(bullets),
        Section::Confidence => parsed.confidence().map(|score| {
            let meter = Meter::new(score);
            format!("{} {}", meter.bar(METER_WIDTH), meter)
        }),
        Section::Tasks => parsed
            .tasks()
            .map(|tasks| TaskListState::expanded_all(tasks).render(tasks)),
        Section::RawResponse | Section::StructuredData => None,
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  • {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("  {}. {}", idx + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Option<String> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Some(json),
        Err(e) => {
            log::warn!("Failed to serialize for display: {}", e);
            None
        }
    }
}
