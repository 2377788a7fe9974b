//! Conversation memory with a token budget.
//!
//! The memory owns how new content enters the session history. When the
//! history outgrows the input budget it is compacted: everything after the
//! system turn is summarized through one extra model call and replaced by a
//! three-turn summary exchange. Compaction is lossy by design but never
//! drops the system turn at index 0, and a failed summarization call fails
//! the enclosing request rather than letting an over-budget prompt through.

use crate::prompt::CHAT_INSTRUCTION;
use sqlchat_core::{count_tokens, AgentError, Session, Turn};
use sqlchat_llm::ModelClient;
use std::sync::Arc;

/// User turn recorded in place of the summarized history.
pub const SUMMARY_REQUEST: &str = "Summarize my previous conversation into a brief summary.";

/// Instruction sent to the model to produce the summary.
const SUMMARIZE_INSTRUCTION: &str = "\
Produce a brief prose summary of this conversation, covering every question \
that was asked and every answer that was given.";

/// Outcome of threading new content into the session history.
#[derive(Debug)]
pub struct BudgetedTurns {
    /// The full turn sequence ready to send.
    pub turns: Vec<Turn>,
    /// Number of turns replaced by a summary, when compaction fired.
    pub compacted: Option<usize>,
}

pub struct ConversationMemory {
    client: Arc<dyn ModelClient>,
    model: String,
    input_token_limit: u32,
    compaction_min_turns: usize,
}

impl ConversationMemory {
    pub fn new(
        client: Arc<dyn ModelClient>,
        model: impl Into<String>,
        input_token_limit: u32,
        compaction_min_turns: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            input_token_limit,
            compaction_min_turns,
        }
    }

    /// Append `new_content` as the next user turn, compacting the history
    /// first if it exceeds the token budget. Returns the sequence ready to
    /// send; the caller appends the eventual assistant reply.
    pub async fn append_and_budget(
        &self,
        new_content: String,
        session: &mut Session,
    ) -> Result<BudgetedTurns, AgentError> {
        let content = format!("{new_content}\n\n{CHAT_INSTRUCTION}");

        let used = count_tokens(&session.turns, &self.model);
        let compacted = if used > self.input_token_limit
            && session.turns.len() > self.compaction_min_turns
        {
            Some(self.compact(session).await?)
        } else {
            None
        };

        session.push_turn(Turn::user(content));
        Ok(BudgetedTurns {
            turns: session.turns.clone(),
            compacted,
        })
    }

    /// Replace everything after the system turn with a summary exchange:
    /// `[system, user(summary request), assistant(summary)]`.
    async fn compact(&self, session: &mut Session) -> Result<usize, AgentError> {
        let system = session.turns[0].clone();
        let summarized = session.turns.len() - 1;

        let mut request: Vec<Turn> = session.turns[1..].to_vec();
        request.push(Turn::user(SUMMARIZE_INSTRUCTION));

        let summary = self
            .client
            .chat(&request, Some(&self.model))
            .await
            .map_err(|e| AgentError::Summarization(e.to_string()))?;

        log::info!(
            "compacted {} turns into a summary of {} chars",
            summarized,
            summary.len()
        );

        session.turns = vec![
            system,
            Turn::user(SUMMARY_REQUEST),
            Turn::assistant(summary),
        ];
        Ok(summarized)
    }
}
