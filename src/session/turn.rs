use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Token counts reported by an agent. Adding two usages sums both counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Content of a file attached to a message with an `@path` mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// A completed tool invocation recorded on an assistant turn.
///
/// The result is stored in full even when the display shortens it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    pub result: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_context: Vec<FileContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, file_context: Vec<FileContent>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            file_context,
            tool_uses: Vec::new(),
            usage: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        tool_uses: Vec<ToolUse>,
        usage: Option<TokenUsage>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            file_context: Vec::new(),
            tool_uses,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals_saturate() {
        let mut usage = TokenUsage::new(u64::MAX - 1, 5);
        assert_eq!(usage.total(), u64::MAX);

        usage += TokenUsage::new(10, 1);
        assert_eq!(usage, TokenUsage::new(u64::MAX, 6));
        assert_eq!(usage.total(), u64::MAX);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ConversationTurn::user("hi", Vec::new());
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], "user");
        assert!(value.get("usage").is_none());
    }
}
