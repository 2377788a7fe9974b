pub mod budget;
pub mod error;
pub mod events;
pub mod query;
pub mod session;
pub mod sql;

pub use budget::{count_tokens, context_window, input_token_limit, TokenCounter};
pub use error::AgentError;
pub use events::AgentEvent;
pub use query::QueryResult;
pub use session::{Role, Session, Turn};
pub use sql::{classify, extract_sql, SqlClassification};
