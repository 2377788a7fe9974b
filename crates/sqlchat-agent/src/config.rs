use sqlchat_core::budget::input_token_limit;
use std::time::Duration;

/// Configuration for one agent instance.
pub struct AgentConfig {
    /// Model name sent to the client and used for token accounting.
    pub model: String,
    /// Total generation attempts per question, including the first.
    pub max_retry: usize,
    /// Rows rendered verbatim in the answer prompt before eliding.
    pub result_row_limit: usize,
    /// Input budget that triggers history compaction when exceeded.
    pub input_token_limit: u32,
    /// Compaction never fires with this many turns or fewer.
    pub compaction_min_turns: usize,
    /// Pause before a retry attempt.
    pub retry_delay: Duration,
    /// Stream the final answer instead of waiting for the full text.
    pub stream_answer: bool,
}

impl AgentConfig {
    /// Defaults for `model`, with the input budget derived from its
    /// context window minus reply headroom.
    pub fn for_model(model: impl Into<String>) -> Self {
        let model = model.into();
        let limit = input_token_limit(&model);
        Self {
            model,
            max_retry: 3,
            result_row_limit: 20,
            input_token_limit: limit,
            compaction_min_turns: 5,
            retry_delay: Duration::from_millis(500),
            stream_answer: false,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::for_model("gpt-4o-mini")
    }
}
