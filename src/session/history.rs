use super::turn::{ConversationTurn, TokenUsage};

/// Ordered turn history plus the running token totals for one REPL session.
///
/// Turns are never edited after they are appended; the history only changes
/// wholesale through [`Session::clear`] and [`Session::replace_with_summary`].
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<ConversationTurn>,
    stats: TokenUsage,
    last_response: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_turn(&mut self, turn: ConversationTurn) {
        if let Some(usage) = turn.usage {
            self.stats += usage;
        }
        self.history.push(turn);
    }

    /// Snapshot of the history. Later changes to the session do not affect it.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history.clone()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn stats(&self) -> TokenUsage {
        self.stats
    }

    pub fn clear(&mut self) {
        self.history = Vec::new();
        self.stats = TokenUsage::default();
    }

    pub fn replace_with_summary(&mut self, summary: impl Into<String>) {
        let summary_turn = ConversationTurn::assistant(summary, Vec::new(), None);
        self.history = vec![summary_turn];
        self.stats = TokenUsage::default();
    }

    /// Most recent non-empty assistant response, kept for `/copy`.
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn set_last_response(&mut self, content: impl Into<String>) {
        self.last_response = Some(content.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn turn_with_usage(input: u64, output: u64) -> ConversationTurn {
        ConversationTurn::assistant("ok", Vec::new(), Some(TokenUsage::new(input, output)))
    }

    #[test]
    fn test_add_turn_accumulates_usage() {
        let mut session = Session::new();
        session.add_turn(turn_with_usage(10, 5));
        session.add_turn(ConversationTurn::user("hi", Vec::new()));
        session.add_turn(turn_with_usage(3, 2));

        assert_eq!(session.len(), 3);
        assert_eq!(session.stats(), TokenUsage::new(13, 7));
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::user("first", Vec::new()));

        let snapshot = session.history();
        session.add_turn(ConversationTurn::user("second", Vec::new()));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_clear_resets_history_and_stats() {
        let mut session = Session::new();
        session.add_turn(turn_with_usage(10, 5));
        session.clear();

        assert!(session.is_empty());
        assert_eq!(session.stats(), TokenUsage::default());
    }

    #[test]
    fn test_replace_with_summary_leaves_single_turn() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::user("question", Vec::new()));
        session.add_turn(turn_with_usage(100, 50));

        session.replace_with_summary("Summary: 2 turns");

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::Assistant);
        assert_eq!(history[0].content, "Summary: 2 turns");
        assert_eq!(session.stats(), TokenUsage::default());
    }

    #[test]
    fn test_last_response_survives_clear() {
        let mut session = Session::new();
        session.set_last_response("answer");
        session.clear();
        assert_eq!(session.last_response(), Some("answer"));
    }
}
