use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::services::llm_client::{ChatCompletion, ChatMessage};

/// At most this many insights survive parsing.
pub const MAX_INSIGHTS: usize = 3;

/// Only a bounded prefix of the rows goes into the prompt.
const ROW_SAMPLE: usize = 20;

const INSIGHT_TEMPERATURE: f32 = 0.4;
const INSIGHT_MAX_TOKENS: u32 = 500;

/// Substituted by the orchestrator when insight generation fails.
pub const INSIGHT_FALLBACK: &str = "目前無法產生洞察分析。";

/// Second, independent generation call that turns a result set into short
/// numeric observations. Best-effort by contract: callers must absorb every
/// failure.
pub struct InsightGenerator {
    llm: Arc<dyn ChatCompletion>,
}

impl InsightGenerator {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }

    pub async fn generate(
        &self,
        question: &str,
        rows: &[Value],
    ) -> Result<Vec<String>, AppError> {
        let sample_len = rows.len().min(ROW_SAMPLE);
        let sample = serde_json::to_string(&rows[..sample_len])
            .map_err(|e| AppError::Internal(format!("Failed to serialize rows: {}", e)))?;

        let prompt = format!(
            r#"你是一位零售業的資料分析師。根據以下查詢結果，提供 2 到 3 條簡短的觀察。
每條觀察都要包含具體數字，其中至少一條要提出可以採取的行動建議。
用編號清單回覆，每條一行，不要其他說明。

問題: {question}
查詢結果 (前 {sample_len} 筆，共 {total} 筆):
{sample}"#,
            total = rows.len(),
        );

        let reply = self
            .llm
            .complete(&[ChatMessage::user(prompt)], INSIGHT_TEMPERATURE, INSIGHT_MAX_TOKENS)
            .await?;

        Ok(parse_insights(&reply))
    }
}

/// Strip leading enumeration markers, drop blank lines, keep at most three.
fn parse_insights(text: &str) -> Vec<String> {
    let marker = Regex::new(r"^\s*(?:[-•*]|[0-9]+[\.\)、])\s*").unwrap();
    text.lines()
        .map(|line| marker.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_INSIGHTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct MockLlm(Result<String, String>);

    #[async_trait]
    impl ChatCompletion for MockLlm {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, AppError> {
            self.0.clone().map_err(AppError::LlmService)
        }
    }

    #[test]
    fn test_parse_numbered_lines() {
        let parsed = parse_insights("1. 台北門市營收最高，共 45 萬元\n2) 網路商店成長 12%\n3、建議加碼網路廣告");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], "台北門市營收最高，共 45 萬元");
        assert_eq!(parsed[1], "網路商店成長 12%");
        assert_eq!(parsed[2], "建議加碼網路廣告");
    }

    #[test]
    fn test_parse_drops_blanks_and_truncates() {
        let parsed = parse_insights("1. 一\n\n2. 二\n3. 三\n4. 四");
        assert_eq!(parsed, vec!["一", "二", "三"]);
    }

    #[test]
    fn test_parse_bullet_markers() {
        let parsed = parse_insights("- 第一點\n• 第二點");
        assert_eq!(parsed, vec!["第一點", "第二點"]);
    }

    #[tokio::test]
    async fn test_generate_parses_reply() {
        let generator = InsightGenerator::new(Arc::new(MockLlm(Ok(
            "1. 總營收 10000 元\n2. 建議補貨".to_string(),
        ))));
        let rows = vec![json!({"營收": 10000})];
        let insights = generator.generate("營收多少？", &rows).await.unwrap();
        assert_eq!(insights.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_surfaces_llm_error_for_caller_to_absorb() {
        let generator =
            InsightGenerator::new(Arc::new(MockLlm(Err("boom".to_string()))));
        let rows = vec![json!({"營收": 10000})];
        assert!(generator.generate("營收多少？", &rows).await.is_err());
    }

    #[tokio::test]
    async fn test_prompt_row_sample_is_bounded() {
        // 50 rows in, prompt only carries the first 20; just ensure no panic
        let generator = InsightGenerator::new(Arc::new(MockLlm(Ok("1. ok".to_string()))));
        let rows: Vec<_> = (0..50).map(|i| json!({"n": i})).collect();
        let insights = generator.generate("q", &rows).await.unwrap();
        assert_eq!(insights, vec!["ok"]);
    }
}
