use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SafeSql;

/// How a result set should be visualized. Inferred, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Ranked categories, e.g. revenue per store
    Bar,
    /// Values over time
    Line,
    /// Share of a whole
    Pie,
    /// Side-by-side comparison of two series
    Grouped,
    /// Plain tabular readout
    Table,
    /// Nothing to draw
    None,
}

/// The externally visible result of one analytics request.
///
/// Constructed once per request and not mutated after return. Failure
/// responses still carry elapsed time and, where available, the SQL text
/// involved so the operator can diagnose what went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub id: String,
    pub answer: String,
    pub chart: ChartKind,
    pub rows: Vec<serde_json::Value>,
    pub row_count: usize,
    pub insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub answered_at: DateTime<Utc>,
}

impl AnalysisResponse {
    pub fn success(
        answer: String,
        chart: ChartKind,
        rows: Vec<serde_json::Value>,
        insights: Vec<String>,
        sql: SafeSql,
        elapsed_ms: u64,
    ) -> Self {
        let row_count = rows.len();
        Self {
            id: Uuid::new_v4().to_string(),
            answer,
            chart,
            rows,
            row_count,
            insights,
            sql: Some(sql.into_string()),
            elapsed_ms,
            error: None,
            answered_at: Utc::now(),
        }
    }

    pub fn failure(answer: String, error: String, sql: Option<String>, elapsed_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            answer,
            chart: ChartKind::None,
            rows: Vec::new(),
            row_count: 0,
            insights: Vec::new(),
            sql,
            elapsed_ms,
            error: Some(error),
            answered_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_response_shape() {
        let response = AnalysisResponse::failure(
            "查詢未通過安全檢查：Forbidden keyword: DELETE".to_string(),
            "Forbidden keyword: DELETE".to_string(),
            Some("DELETE FROM member_transactions".to_string()),
            12,
        );
        assert!(!response.is_success());
        assert_eq!(response.chart, ChartKind::None);
        assert!(response.rows.is_empty());
        assert_eq!(response.elapsed_ms, 12);
        // Offending SQL is preserved for diagnosis
        assert!(response.sql.as_deref().unwrap().starts_with("DELETE"));
    }

    #[test]
    fn test_success_response_counts_rows() {
        let rows = vec![serde_json::json!({"門市": "台北門市", "營收": 1000})];
        let response = AnalysisResponse::success(
            "門市: 台北門市，營收: 1000".to_string(),
            ChartKind::Table,
            rows,
            vec![],
            SafeSql::new("SELECT 1 LIMIT 100".to_string()),
            5,
        );
        assert!(response.is_success());
        assert_eq!(response.row_count, 1);
        assert_eq!(response.sql.as_deref(), Some("SELECT 1 LIMIT 100"));
    }

    #[test]
    fn test_chart_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ChartKind::Bar).unwrap(), "\"bar\"");
        assert_eq!(serde_json::to_string(&ChartKind::None).unwrap(), "\"none\"");
    }
}
