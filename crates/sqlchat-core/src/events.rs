use serde::{Deserialize, Serialize};

/// Progress events emitted by the agent while answering one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// One chunk of streamed answer text.
    Token { content: String },

    /// A SQL statement was extracted from the model response.
    SqlExtracted { sql: String },

    /// The extracted query ran against the database.
    QueryExecuted { row_count: usize },

    /// A generation attempt failed; the next attempt carries this feedback.
    Retrying { attempt: usize, feedback: String },

    /// Older turns were replaced by a model-generated summary.
    ContextSummarized { turns_summarized: usize },

    Complete { answer: String },

    Error { message: String },
}
