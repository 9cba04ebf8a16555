use std::sync::Arc;
use std::time::Instant;

use crate::api::middleware::AppError;
use crate::config::QueryConfig;
use crate::models::{AnalysisResponse, ChatTurn};
use crate::services::database::QueryExecutor;
use crate::services::insight::{InsightGenerator, INSIGHT_FALLBACK};
use crate::services::shaper::shape;
use crate::services::translator::Translator;
use crate::validation::SqlGuard;

/// Sequences the analytics pipeline: translate, validate, execute, shape,
/// insights. One linear happy path with early-exit failure branches; nothing
/// past validation ever executes anything but the single validated statement,
/// and there is no retry within a request.
pub struct AnalyticsService {
    translator: Translator,
    insights: InsightGenerator,
    executor: Arc<dyn QueryExecutor>,
    row_limit: u64,
    query_timeout_secs: u64,
}

impl AnalyticsService {
    pub fn new(
        translator: Translator,
        insights: InsightGenerator,
        executor: Arc<dyn QueryExecutor>,
        query_config: &QueryConfig,
    ) -> Self {
        Self {
            translator,
            insights,
            executor,
            row_limit: query_config.row_limit,
            query_timeout_secs: query_config.timeout_secs,
        }
    }

    pub async fn ask(&self, question: &str, history: &[ChatTurn]) -> AnalysisResponse {
        let start_time = Instant::now();
        tracing::info!("Processing analytics question: {}", question);

        let generated = match self.translator.translate(question, history).await {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!("SQL generation failed: {}", e);
                return AnalysisResponse::failure(
                    format!("無法產生查詢：{}", error_message(&e)),
                    error_message(&e),
                    None,
                    elapsed_ms(start_time),
                );
            }
        };

        tracing::info!("Generated SQL: {}", generated.as_str());

        let safe = match SqlGuard::validate(&generated, self.row_limit) {
            Ok(safe) => safe,
            Err(e) => {
                tracing::warn!(
                    "Generated SQL rejected: {} ({})",
                    error_message(&e),
                    generated.as_str()
                );
                // Keep the original generated text for operator diagnosis
                return AnalysisResponse::failure(
                    format!("查詢未通過安全檢查：{}", error_message(&e)),
                    error_message(&e),
                    Some(generated.as_str().to_string()),
                    elapsed_ms(start_time),
                );
            }
        };

        let result = match self
            .executor
            .execute(safe.as_str(), self.query_timeout_secs)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Query execution failed: {}", error_message(&e));
                return AnalysisResponse::failure(
                    format!("查詢執行失敗：{}", error_message(&e)),
                    error_message(&e),
                    Some(safe.as_str().to_string()),
                    elapsed_ms(start_time),
                );
            }
        };

        let shaped = shape(question, result.rows);

        let insights = if shaped.rows.is_empty() {
            Vec::new()
        } else {
            match self.insights.generate(question, &shaped.rows).await {
                Ok(insights) if !insights.is_empty() => insights,
                Ok(_) => vec![INSIGHT_FALLBACK.to_string()],
                Err(e) => {
                    tracing::warn!("Insight generation failed: {}", error_message(&e));
                    vec![INSIGHT_FALLBACK.to_string()]
                }
            }
        };

        AnalysisResponse::success(
            shaped.summary,
            shaped.chart,
            shaped.rows,
            insights,
            safe,
            elapsed_ms(start_time),
        )
    }
}

fn elapsed_ms(start_time: Instant) -> u64 {
    start_time.elapsed().as_millis() as u64
}

fn error_message(error: &AppError) -> String {
    match error {
        AppError::LlmService(msg)
        | AppError::RejectedSql(msg)
        | AppError::Execution(msg)
        | AppError::Validation(msg)
        | AppError::Config(msg)
        | AppError::Internal(msg) => msg.clone(),
    }
}
