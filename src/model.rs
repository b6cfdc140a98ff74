use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

/// Backend-assigned identifier of a stored log entry.
///
/// The backend currently emits numeric ids; string ids are accepted as-is so the client
/// never has to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogId::Number(n) => write!(f, "{n}"),
            LogId::Text(s) => f.write_str(s),
        }
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// A stored log record as returned by the backend. Never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub level: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_line: Option<String>,
}

/// Body of the ingest call. `lines` is always produced by [`crate::input::normalize_lines`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub service_name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub pattern: String,
    pub count: u64,
    pub explanation: String,
    pub suggested_fix: String,
}

/// Backend analysis of the full stored log set. Cluster order is kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub overall_summary: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogsState {
    pub data: Vec<LogEntry>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestState {
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisState {
    pub data: Option<AnalysisResult>,
    pub pending: bool,
    pub error: Option<String>,
}

/// All three controller slices captured at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub logs: LogsState,
    pub ingest: IngestState,
    pub analysis: AnalysisState,
}

/// Emitted by the controller whenever a slice changes; carries the new value of that slice.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    Logs(LogsState),
    Ingest(IngestState),
    Analysis(AnalysisState),
    // Orchestrator-level messages (task failures, shutdown).
    Info(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_accepts_backend_shape() {
        let json = r#"{
            "id": 7,
            "timestamp": "2025-12-05T10:15:30",
            "level": "ERROR",
            "serviceName": "OrderService",
            "message": "OrderService - Failed to connect to database",
            "rawLine": "2025-12-05 10:15:30 ERROR OrderService - Failed to connect to database"
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, LogId::Number(7));
        assert_eq!(entry.service_name, "OrderService");
        assert_eq!(entry.level, "ERROR");
        assert!(entry.raw_line.is_some());
    }

    #[test]
    fn log_entry_tolerates_nulls_and_string_ids() {
        let json = r#"{"id": "a1b2", "timestamp": null, "level": null, "message": "x"}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id.to_string(), "a1b2");
        assert_eq!(entry.timestamp, "");
        assert_eq!(entry.level, "");
        assert_eq!(entry.service_name, "");
        assert_eq!(entry.raw_line, None);
    }

    #[test]
    fn ingest_request_uses_camel_case() {
        let req = IngestRequest {
            service_name: "OrderService".into(),
            lines: vec!["a".into(), "b".into()],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"serviceName": "OrderService", "lines": ["a", "b"]})
        );
    }

    #[test]
    fn analysis_result_keeps_cluster_order() {
        let json = r#"{
            "clusters": [
                {"pattern": "Timeout errors", "count": 2, "explanation": "e1", "suggestedFix": "f1"},
                {"pattern": "Database connectivity errors", "count": 5, "explanation": "e2", "suggestedFix": "f2"}
            ],
            "overallSummary": "Analyzed 7 log entries"
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        let patterns: Vec<_> = result.clusters.iter().map(|c| c.pattern.as_str()).collect();
        assert_eq!(
            patterns,
            vec!["Timeout errors", "Database connectivity errors"]
        );
        assert_eq!(result.clusters[1].suggested_fix, "f2");
    }

    #[test]
    fn analysis_result_defaults_missing_fields() {
        let result: AnalysisResult = serde_json::from_str("{}").unwrap();
        assert!(result.clusters.is_empty());
        assert!(result.overall_summary.is_empty());
    }
}
