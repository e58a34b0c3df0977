//! JSON and Markdown export of analysis results

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{ErrorContext, Result, ServiceError};
use crate::render::{Meter, PriorityTone, UNTITLED};
use crate::services::explainer::{AnalysisResult, ParsedExplanation};

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Markdown => write!(f, "Markdown"),
        }
    }
}

/// Pretty JSON of `parsed`, or of the whole result when `parsed` is absent
pub fn export_json(result: &AnalysisResult) -> Result<String> {
    let json = match &result.parsed {
        Some(parsed) => serde_json::to_string_pretty(parsed)?,
        None => serde_json::to_string_pretty(result)?,
    };
    Ok(json)
}

/// Markdown document with a fixed heading per present field.
///
/// Order: summary, severity, confidence, root cause, probable fixes,
/// reproduction steps, follow-up tests, notes, tasks. Without structured
/// data the raw text is exported in a fenced block.
pub fn export_markdown(result: &AnalysisResult) -> String {
    let mut blocks = vec!["# Log Analysis".to_string()];

    match &result.parsed {
        Some(parsed) => blocks.extend(parsed_blocks(parsed)),
        None => {
            if let Some(raw) = result.raw_text() {
                blocks.push(format!("## Raw Output\n\n```\n{}\n```", raw));
            }
        }
    }

    let mut document = blocks.join("\n\n");
    document.push('\n');
    document
}

fn parsed_blocks(parsed: &ParsedExplanation) -> Vec<String> {
    let mut blocks = Vec::new();

    if let Some(summary) = parsed.summary() {
        blocks.push(section("Summary", summary));
    }
    if let Some(severity) = parsed.severity() {
        blocks.push(section("Severity", severity.trim()));
    }
    if let Some(confidence) = parsed.confidence() {
        blocks.push(section("Confidence", &Meter::new(confidence).to_string()));
    }
    if let Some(root_cause) = parsed.root_cause() {
        blocks.push(section("Root Cause", root_cause));
    }
    if let Some(fixes) = parsed.probable_fixes() {
        blocks.push(section("Probable Fixes", &bullet_list(fixes)));
    }
    if let Some(steps) = parsed.reproduction_steps() {
        let numbered = steps
            .iter()
            .enumerate()
            .map(|(idx, step)| format!("{}. {}", idx + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(section("Reproduction Steps", &numbered));
    }
    if let Some(tests) = parsed.follow_up_tests() {
        blocks.push(section("Follow-up Tests", &bullet_list(tests)));
    }
    if let Some(notes) = parsed.notes() {
        blocks.push(section("Notes", notes));
    }
    if let Some(tasks) = parsed.tasks() {
        let checklist = tasks
            .iter()
            .map(|task| {
                let title = match task.title.trim() {
                    "" => UNTITLED,
                    title => title,
                };
                let mut line = format!("- [ ] {}", title);
                if let Some(priority) = task.priority() {
                    line.push_str(&format!(
                        " {} ({})",
                        PriorityTone::from_priority(Some(priority)).icon(),
                        priority
                    ));
                }
                if let Some(description) = task.description() {
                    line.push_str(&format!(": {}", description));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(section("Tasks", &checklist));
    }

    blocks
}

fn section(title: &str, body: &str) -> String {
    format!("## {}\n\n{}", title, body)
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a result in the given export format
pub fn export(result: &AnalysisResult, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(result),
        ExportFormat::Markdown => Ok(export_markdown(result)),
    }
}

/// Suggested download name, e.g. `log-analysis-20240311-101502.md`
pub fn export_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "log-analysis-{}.{}",
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Suggested download name for an export made now
pub fn default_file_name(format: ExportFormat) -> String {
    export_file_name(format, Utc::now())
}

/// Write an export to `path`
pub fn write_export(result: &AnalysisResult, format: ExportFormat, path: &Path) -> Result<()> {
    let contents = export(result, format)?;
    std::fs::write(path, contents).map_err(|e| {
        ServiceError::internal(format!("Failed to write {} export: {}", format, e))
            .with_context(ErrorContext::for_service("export").with("path", path.display()))
    })?;

    log::info!("Wrote {} export to {}", format, path.display());
    Ok(())
}
