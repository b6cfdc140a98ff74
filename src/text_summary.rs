//! Text summary builder for CLI output.
//!
//! Formats the controller's slices as human-readable lines for text mode.

use crate::model::{AnalysisResult, LogEntry};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

/// One line per stored entry: `id  timestamp  level  service  message`.
pub(crate) fn build_logs_summary(entries: &[LogEntry]) -> TextSummary {
    if entries.is_empty() {
        return TextSummary {
            lines: vec!["No logs stored yet.".to_string()],
        };
    }

    let id_width = entries
        .iter()
        .map(|e| e.id.to_string().chars().count())
        .max()
        .unwrap_or(2)
        .max(2);
    let level_width = entries
        .iter()
        .map(|e| or_dash(&e.level).chars().count())
        .max()
        .unwrap_or(5)
        .max(5);
    let service_width = entries
        .iter()
        .map(|e| or_dash(&e.service_name).chars().count())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!(
        "{:<id_width$}  {:<19}  {:<level_width$}  {:<service_width$}  Message",
        "ID", "Timestamp", "Level", "Service"
    ));
    for e in entries {
        lines.push(format!(
            "{:<id_width$}  {:<19}  {:<level_width$}  {:<service_width$}  {}",
            e.id.to_string(),
            or_dash(&e.timestamp),
            or_dash(&e.level),
            or_dash(&e.service_name),
            e.message
        ));
    }
    TextSummary { lines }
}

/// Summary paragraph followed by one block per cluster, in backend order.
pub(crate) fn build_analysis_summary(result: &AnalysisResult) -> TextSummary {
    let mut lines = vec![
        "Overall summary:".to_string(),
        format!("  {}", or_dash(&result.overall_summary)),
    ];

    if result.clusters.is_empty() {
        lines.push(String::new());
        lines.push("No issue clusters reported.".to_string());
    }
    for (idx, c) in result.clusters.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("[{}] {} (count: {})", idx + 1, c.pattern, c.count));
        lines.push(format!("    Explanation:   {}", c.explanation));
        lines.push(format!("    Suggested fix: {}", c.suggested_fix));
    }
    TextSummary { lines }
}
