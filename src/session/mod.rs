mod history;
mod turn;

pub use history::Session;
pub use turn::{ConversationTurn, FileContent, Role, TokenUsage, ToolUse};
