//! Token counting for budget enforcement.
//!
//! GPT-family models get exact counts through tiktoken plus the structural
//! per-message and per-request overheads chat-completion APIs bill for, so
//! the budget check stays conservative. Every other model falls back to a
//! word-count heuristic; an unknown model name never fails the count.

use crate::session::Turn;
use tiktoken_rs::CoreBPE;

/// Structural tokens billed per message by chat-completion APIs.
pub const PER_TURN_OVERHEAD: u32 = 2;
/// Structural tokens billed once per request.
pub const PER_REQUEST_OVERHEAD: u32 = 3;
/// Empirical words-to-tokens ratio for the heuristic fallback.
const WORDS_TO_TOKENS_RATIO: f64 = 4.0 / 3.0;

pub trait TokenCounter: Send + Sync {
    fn count_turns(&self, turns: &[Turn]) -> u32;
}

/// Count the tokens a request built from `turns` would consume for `model`.
pub fn count_tokens(turns: &[Turn], model: &str) -> u32 {
    match ExactCounter::for_model(model) {
        Some(counter) => counter.count_turns(turns),
        None => WordHeuristicCounter.count_turns(turns),
    }
}

/// Exact counter backed by the model's tiktoken encoding.
pub struct ExactCounter {
    bpe: CoreBPE,
}

impl ExactCounter {
    /// Returns `None` when no exact tokenizer exists for the model family.
    pub fn for_model(model: &str) -> Option<Self> {
        tiktoken_rs::get_bpe_from_model(model)
            .ok()
            .map(|bpe| Self { bpe })
    }
}

impl TokenCounter for ExactCounter {
    fn count_turns(&self, turns: &[Turn]) -> u32 {
        let per_turn: u32 = turns
            .iter()
            .map(|turn| {
                let content = self.bpe.encode_with_special_tokens(&turn.content).len() as u32;
                content.saturating_add(PER_TURN_OVERHEAD)
            })
            .fold(0u32, |acc, n| acc.saturating_add(n));
        per_turn.saturating_add(PER_REQUEST_OVERHEAD)
    }
}

/// Fallback counter: whitespace-split word count of `"role: content"` scaled
/// by the words-to-tokens ratio.
pub struct WordHeuristicCounter;

impl TokenCounter for WordHeuristicCounter {
    fn count_turns(&self, turns: &[Turn]) -> u32 {
        let words: usize = turns
            .iter()
            .map(|turn| {
                format!("{}: {}", turn.role, turn.content)
                    .split_whitespace()
                    .count()
            })
            .sum();
        (words as f64 * WORDS_TO_TOKENS_RATIO).ceil() as u32
    }
}
