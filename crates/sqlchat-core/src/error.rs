use thiserror::Error;

/// Error taxonomy for one question/answer request.
///
/// The three retryable kinds are converted into natural-language feedback
/// for the next generation attempt; everything else terminates the request.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Network or API failure talking to the model. Never retried by the
    /// agent loop; the transport layer owns its own backoff.
    #[error("model transport error: {0}")]
    Transport(String),

    #[error("no sql-fenced code block found in model response")]
    NoSqlBlock,

    #[error("mutating statement detected: {0}")]
    MutatingStatement(String),

    #[error("query execution failed: {0}")]
    Execution(String),

    /// Compaction is not optional: a failed summarization call fails the
    /// enclosing request instead of sending an over-budget prompt.
    #[error("conversation summarization failed: {0}")]
    Summarization(String),

    /// Terminal state after the retry bound; carries the last feedback as
    /// the user-visible failure reason.
    #[error("retries exhausted after {attempts} attempts: {feedback}")]
    RetriesExhausted { attempts: usize, feedback: String },

    #[error("cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::NoSqlBlock
                | AgentError::MutatingStatement(_)
                | AgentError::Execution(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(AgentError::NoSqlBlock.is_retryable());
        assert!(AgentError::MutatingStatement("UPDATE".into()).is_retryable());
        assert!(AgentError::Execution("syntax error".into()).is_retryable());
        assert!(!AgentError::Transport("connection refused".into()).is_retryable());
        assert!(!AgentError::Summarization("timeout".into()).is_retryable());
        assert!(!AgentError::Cancelled.is_retryable());
    }
}
