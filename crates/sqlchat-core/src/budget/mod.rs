//! Token budget management for the conversation history.
//!
//! - [`counter`]: token counting, exact (tiktoken) where available with a
//!   word-count fallback for everything else
//! - [`limits`]: known model context windows used to derive the input budget

pub mod counter;
pub mod limits;

pub use counter::{count_tokens, ExactCounter, TokenCounter, WordHeuristicCounter};
pub use limits::{context_window, input_token_limit, DEFAULT_HEADROOM};
