use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged message unit in a conversation. Immutable once created;
/// chronological order within a session is significant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Mutable conversation state for one user interaction stream.
///
/// Invariant: whenever `turns` is non-empty, `turns[0]` is the system turn
/// currently in force. Compaction replaces the rest of the history with a
/// summary but never removes that system turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Current user question; `None` before the first exchange.
    pub question: Option<String>,
    /// Schema rendering fetched once from the database when the session opens.
    pub schema_text: String,
    pub turns: Vec<Turn>,
    /// Number of completed question/answer exchanges.
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(schema_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            question: None,
            schema_text: schema_text.into(),
            turns: Vec::new(),
            turn_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    pub fn has_history(&self) -> bool {
        !self.turns.is_empty()
    }

    /// Record one finished question/answer exchange.
    pub fn complete_exchange(&mut self) {
        self.turn_count += 1;
        self.updated_at = Utc::now();
    }

    /// Discard the conversation while keeping the schema, as when the user
    /// opens a fresh session against the same database.
    pub fn reset(&mut self) {
        self.question = None;
        self.turns.clear();
        self.turn_count = 0;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_displays_lowercase() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[test]
    fn session_starts_empty() {
        let session = Session::new("CREATE TABLE t (id INTEGER);");
        assert!(session.question.is_none());
        assert!(!session.has_history());
        assert_eq!(session.turn_count, 0);
    }

    #[test]
    fn system_turn_stays_first_across_exchanges() {
        let mut session = Session::new("");
        session.push_turn(Turn::system("instructions"));
        for _ in 0..3 {
            session.push_turn(Turn::user("q"));
            session.push_turn(Turn::assistant("a"));
            session.complete_exchange();
        }
        assert_eq!(session.turns[0].role, Role::System);
        assert_eq!(session.turns[0].content, "instructions");
        assert_eq!(session.turn_count, 3);
    }

    #[test]
    fn reset_clears_history_but_keeps_schema() {
        let mut session = Session::new("CREATE TABLE t (id INTEGER);");
        session.question = Some("how many rows?".to_string());
        session.push_turn(Turn::system("instructions"));
        session.complete_exchange();
        session.reset();
        assert!(session.turns.is_empty());
        assert!(session.question.is_none());
        assert_eq!(session.turn_count, 0);
        assert_eq!(session.schema_text, "CREATE TABLE t (id INTEGER);");
    }
}
