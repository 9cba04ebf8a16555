use serde::{Deserialize, Serialize};

/// One prior turn of the conversation, used only as prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    /// Render the turn as plain text for prompt context.
    pub fn render(&self) -> String {
        match self.role {
            TurnRole::User => format!("使用者: {}", self.content),
            TurnRole::Assistant => format!("助理: {}", self.content),
        }
    }
}

/// Render the most recent `max_turns` turns as prompt context, oldest first.
pub fn render_recent_turns(turns: &[ChatTurn], max_turns: usize) -> String {
    let start = turns.len().saturating_sub(max_turns);
    turns[start..]
        .iter()
        .map(ChatTurn::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_roles() {
        assert_eq!(ChatTurn::user("上個月營收多少？").render(), "使用者: 上個月營收多少？");
        assert_eq!(ChatTurn::assistant("查詢到 5 筆結果。").render(), "助理: 查詢到 5 筆結果。");
    }

    #[test]
    fn test_render_recent_turns_bounded() {
        let turns: Vec<ChatTurn> = (0..10).map(|i| ChatTurn::user(format!("q{}", i))).collect();
        let rendered = render_recent_turns(&turns, 6);
        // Only the six most recent turns survive
        assert!(!rendered.contains("q3"));
        assert!(rendered.contains("q4"));
        assert!(rendered.contains("q9"));
        assert_eq!(rendered.lines().count(), 6);
    }

    #[test]
    fn test_render_recent_turns_empty() {
        assert_eq!(render_recent_turns(&[], 6), "");
    }
}
