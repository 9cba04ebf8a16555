use serde_json::Value;

use crate::api::middleware::AppError;

/// Query execution result. Rows are JSON objects whose keys keep the SELECT
/// column order.
#[derive(Debug)]
pub struct QueryResult {
    pub rows: Vec<Value>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

/// Read-only query executor boundary.
///
/// Implementations must enforce the statement timeout themselves; the caller
/// treats a timeout like any other execution failure. The SQL handed in here
/// has already passed the guard and is fully self-contained, with no bound
/// parameters.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, timeout_secs: u64) -> Result<QueryResult, AppError>;

    /// Cheap connectivity probe for startup and health checks.
    async fn test_connection(&self) -> Result<(), AppError>;
}
