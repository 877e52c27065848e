use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One tool invocation, success or failure. Append-only: the gateway never
/// updates or deletes a record once written. Serialized field names are the
/// stable compliance contract (`sessionId`, `argsJson`, `durationMs`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub tenant_id: String,
    pub session_id: String,
    pub tool: String,
    pub args_json: Value,
    pub result_json: Option<Value>,
    pub ok: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub simulated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum AuditStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit writer is no longer running")]
    WriterGone,
}

/// Write path. Implementations may buffer internally; the orchestrator
/// treats failures as non-fatal and never surfaces them to the caller.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditStoreError>;
}

/// Read path for compliance and observability consumers.
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// Records for one session, in insertion order.
    async fn session_history(&self, session_id: &str) -> Result<Vec<AuditRecord>, AuditStoreError>;

    /// Aggregates for one tenant over records created at or after `since`.
    async fn stats(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<AuditStats, AuditStoreError>;
}

/// Aggregate statistics over a window of audit records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub tool_usage: BTreeMap<String, u64>,
}

impl AuditStats {
    /// Tolerates an empty window: zero records yield all-zero stats.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AuditRecord>) -> Self {
        let mut total = 0u64;
        let mut successful = 0u64;
        let mut duration_sum = 0u64;
        let mut tool_usage: BTreeMap<String, u64> = BTreeMap::new();

        for record in records {
            total += 1;
            if record.ok {
                successful += 1;
            }
            duration_sum += record.duration_ms;
            *tool_usage.entry(record.tool.clone()).or_insert(0) += 1;
        }

        let (success_rate, avg_duration_ms) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                successful as f64 / total as f64,
                duration_sum as f64 / total as f64,
            )
        };

        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
            avg_duration_ms,
            tool_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(tool: &str, ok: bool, duration_ms: u64) -> AuditRecord {
        AuditRecord {
            tenant_id: "t1".into(),
            session_id: "s1".into(),
            tool: tool.into(),
            args_json: json!({}),
            result_json: ok.then(|| json!({"done": true})),
            ok,
            error: (!ok).then(|| "boom".to_string()),
            duration_ms,
            simulated: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stats_over_empty_window_are_zero() {
        let stats = AuditStats::from_records([]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_duration_ms, 0.0);
        assert!(stats.tool_usage.is_empty());
    }

    #[test]
    fn stats_aggregate_counts_and_durations() {
        let records = vec![
            record("list_clients", true, 10),
            record("list_clients", true, 20),
            record("send_invoice", false, 30),
        ];
        let stats = AuditStats::from_records(&records);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_duration_ms - 20.0).abs() < 1e-9);
        assert_eq!(stats.tool_usage.get("list_clients"), Some(&2));
        assert_eq!(stats.tool_usage.get("send_invoice"), Some(&1));
    }

    #[test]
    fn record_serializes_with_contract_field_names() {
        let json = serde_json::to_value(record("send_invoice", true, 12)).unwrap();
        for key in [
            "tenantId",
            "sessionId",
            "tool",
            "argsJson",
            "resultJson",
            "ok",
            "error",
            "durationMs",
            "simulated",
            "createdAt",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
