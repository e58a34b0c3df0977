//! Tests for JSON and Markdown export

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use crate::export::{
        export_file_name, export_json, export_markdown, write_export, ExportFormat,
    };
    use crate::services::explainer::{AnalysisResult, ParsedExplanation, Task};

    fn full_result() -> AnalysisResult {
        AnalysisResult {
            raw_text: Some("raw model output".to_string()),
            parsed: Some(ParsedExplanation {
                summary: Some("Pool exhausted".to_string()),
                root_cause: Some("Leaked connections".to_string()),
                severity: Some("High".to_string()),
                probable_fixes: Some(vec!["Close connections".to_string(), "Raise pool size".to_string()]),
                reproduction_steps: Some(vec!["Start load test".to_string(), "Watch pool".to_string()]),
                follow_up_tests: Some(vec!["Soak test".to_string()]),
                confidence_score: Some(87.4),
                notes: Some("Seen before".to_string()),
                tasks: Some(vec![Task {
                    id: "t1".to_string(),
                    title: "Add leak detection".to_string(),
                    description: Some("Enable leakDetectionThreshold".to_string()),
                    priority: Some("high".to_string()),
                }]),
                ..Default::default()
            }),
        }
    }

    fn headings(markdown: &str) -> Vec<&str> {
        markdown
            .lines()
            .filter_map(|line| line.strip_prefix("## "))
            .collect()
    }

    #[test]
    fn test_markdown_heading_order() {
        let markdown = export_markdown(&full_result());

        assert!(markdown.starts_with("# Log Analysis\n"));
        assert_eq!(
            headings(&markdown),
            vec![
                "Summary",
                "Severity",
                "Confidence",
                "Root Cause",
                "Probable Fixes",
                "Reproduction Steps",
                "Follow-up Tests",
                "Notes",
                "Tasks"
            ]
        );
        assert!(markdown.contains("- Close connections\n- Raise pool size"));
        assert!(markdown.contains("1. Start load test\n2. Watch pool"));
        assert!(markdown.contains("87%"));
        assert!(markdown.contains("- [ ] Add leak detection"));
    }

    #[test]
    fn test_markdown_omits_absent_fields() {
        let mut result = full_result();
        if let Some(parsed) = result.parsed.as_mut() {
            parsed.severity = None;
            parsed.probable_fixes = Some(Vec::new());
            parsed.notes = Some("  ".to_string());
            parsed.tasks = None;
        }

        assert_eq!(
            headings(&export_markdown(&result)),
            vec![
                "Summary",
                "Confidence",
                "Root Cause",
                "Reproduction Steps",
                "Follow-up Tests"
            ]
        );
    }

    #[test]
    fn test_markdown_without_parsed() {
        let markdown = export_markdown(&AnalysisResult::from_raw("just text"));
        assert_eq!(headings(&markdown), vec!["Raw Output"]);
        assert!(markdown.contains("just text"));

        let empty = export_markdown(&AnalysisResult::default());
        assert!(headings(&empty).is_empty());
    }

    #[test]
    fn test_json_exports_parsed_only() {
        let json: Value = serde_json::from_str(&export_json(&full_result()).unwrap()).unwrap();
        assert_eq!(json["summary"], "Pool exhausted");
        assert!(json.get("raw_llm").is_none());
    }

    #[test]
    fn test_json_exports_whole_result_without_parsed() {
        let json: Value =
            serde_json::from_str(&export_json(&AnalysisResult::from_raw("text")).unwrap()).unwrap();
        assert_eq!(json, json!({"raw_llm": "text"}));
    }

    #[test]
    fn test_json_keeps_unknown_fields() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "parsed": {"summary": "s", "issue": "extra field"}
        }))
        .unwrap();
        let json: Value = serde_json::from_str(&export_json(&result).unwrap()).unwrap();
        assert_eq!(json["issue"], "extra field");
    }

    #[test]
    fn test_file_names() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 11, 10, 15, 2).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Json, at),
            "log-analysis-20240311-101502.json"
        );
        assert_eq!(
            export_file_name(ExportFormat::Markdown, at),
            "log-analysis-20240311-101502.md"
        );
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.md");

        write_export(&full_result(), ExportFormat::Markdown, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, export_markdown(&full_result()));
    }
}
