pub mod config;
pub mod memory;
pub mod prompt;
pub mod runner;
pub mod stream;

pub use config::AgentConfig;
pub use memory::ConversationMemory;
pub use runner::{CandidateSql, QuestionOutcome, RetryAgent};
pub use stream::consume_model_stream;
