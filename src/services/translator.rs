use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::models::{render_recent_turns, ChatTurn, GeneratedSql};
use crate::services::llm_client::{ChatCompletion, ChatMessage};
use crate::services::schema_context::schema_context;
use crate::validation::{PURCHASE_CATEGORY, TRANSACTION_TABLE, VALID_CATEGORIES};

/// Near-deterministic sampling keeps generated SQL shapes reproducible.
const TRANSLATE_TEMPERATURE: f32 = 0.1;
const TRANSLATE_MAX_TOKENS: u32 = 1000;

/// Turns a natural-language question into a candidate SQL statement.
///
/// Output is untrusted text: all safety and semantic checks belong to the
/// SQL guard, not here.
pub struct Translator {
    llm: Arc<dyn ChatCompletion>,
    row_limit: u64,
    max_context_turns: usize,
}

impl Translator {
    pub fn new(llm: Arc<dyn ChatCompletion>, row_limit: u64, max_context_turns: usize) -> Self {
        Self { llm, row_limit, max_context_turns }
    }

    pub async fn translate(
        &self,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<GeneratedSql, AppError> {
        let messages = self.build_messages(question, history);

        let reply = self
            .llm
            .complete(&messages, TRANSLATE_TEMPERATURE, TRANSLATE_MAX_TOKENS)
            .await?;

        Ok(GeneratedSql::new(strip_code_fences(&reply)))
    }

    fn build_messages(&self, question: &str, history: &[ChatTurn]) -> Vec<ChatMessage> {
        let system_prompt = format!(
            r#"你是一位資深的零售業資料分析師，負責把使用者的問題轉換成 PostgreSQL 查詢。

資料庫結構:
{schema}

產生規則:
1. 只能產生 SELECT 查詢，絕對不能產生任何寫入或修改資料的語句
2. 每個查詢都必須加上 LIMIT，最多 {row_limit} 筆
3. 欄位要使用有意義的中文別名，例如 SUM(amount) AS 營收
4. 問題沒有指定時間範圍時，預設查詢最近 30 天
5. 問題太模糊時，回傳整體營運概況的彙總查詢
6. 用 {table} 計算營收時，必須加上 transaction_type = '{purchase}' 的條件
7. transaction_type 的有效值只有 {categories}

只回傳 SQL 本身，不要任何解釋，也不要 markdown 格式。"#,
            schema = schema_context(),
            row_limit = self.row_limit,
            table = TRANSACTION_TABLE,
            purchase = PURCHASE_CATEGORY,
            categories = VALID_CATEGORIES
                .iter()
                .map(|c| format!("'{}'", c))
                .collect::<Vec<_>>()
                .join("、"),
        );

        let mut messages = vec![ChatMessage::system(system_prompt)];

        let context = render_recent_turns(history, self.max_context_turns);
        if !context.is_empty() {
            messages.push(ChatMessage::user(format!("先前的對話:\n{}", context)));
        }

        messages.push(ChatMessage::user(question.to_string()));
        messages
    }
}

/// Strip surrounding markdown code fences the model may wrap the SQL in.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```sql")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockLlm(String);

    #[async_trait]
    impl ChatCompletion for MockLlm {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, AppError> {
            Ok(self.0.clone())
        }
    }

    fn translator(reply: &str) -> Translator {
        Translator::new(Arc::new(MockLlm(reply.to_string())), 100, 6)
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_code_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
    }

    #[tokio::test]
    async fn test_translate_strips_fences() {
        let sql = translator("```sql\nSELECT id FROM members\n```")
            .translate("列出會員", &[])
            .await
            .unwrap();
        assert_eq!(sql.as_str(), "SELECT id FROM members");
    }

    #[test]
    fn test_messages_embed_schema_and_rules() {
        let messages = translator("").build_messages("上個月營收多少？", &[]);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("member_transactions"));
        assert!(messages[0].content.contains("LIMIT"));
        assert!(messages[0].content.contains("最近 30 天"));
        assert_eq!(messages.last().unwrap().content, "上個月營收多少？");
    }

    #[test]
    fn test_messages_bound_history() {
        let history: Vec<ChatTurn> =
            (0..10).map(|i| ChatTurn::user(format!("問題 {}", i))).collect();
        let messages = translator("").build_messages("下一題", &history);
        // system + bounded context + question
        assert_eq!(messages.len(), 3);
        assert!(!messages[1].content.contains("問題 3"));
        assert!(messages[1].content.contains("問題 9"));
    }

    #[test]
    fn test_no_context_message_without_history() {
        let messages = translator("").build_messages("問題", &[]);
        assert_eq!(messages.len(), 2);
    }
}
