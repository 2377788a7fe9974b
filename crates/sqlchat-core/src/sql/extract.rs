//! Extraction of the generated SQL from the model response.
//!
//! The prompts ask the model to put its query inside a fenced block tagged
//! `sql`; that fence is the only extraction contract. A response without it
//! fails with [`AgentError::NoSqlBlock`] instead of guessing.

use crate::error::AgentError;
use once_cell::sync::Lazy;
use regex::Regex;

static SQL_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```sql(.*?)```").expect("fence pattern is valid"));

/// Return the trimmed contents of the first ```sql fenced block.
pub fn extract_sql(response: &str) -> Result<String, AgentError> {
    SQL_FENCE
        .captures(response)
        .and_then(|captures| captures.get(1))
        .map(|block| block.as_str().trim().to_string())
        .ok_or(AgentError::NoSqlBlock)
}

/// Whether the response contains any fenced block at all. Used to tell a
/// deliberate prose-only answer apart from a malformed fence.
pub fn contains_fence(response: &str) -> bool {
    response.contains("```")
}
