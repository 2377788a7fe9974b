//! SQL safety checks on model output.
//!
//! - [`guard`]: read-only vs. data-mutating classification
//! - [`extract`]: pulling the generated statement out of its fenced block

pub mod extract;
pub mod guard;

pub use extract::{contains_fence, extract_sql};
pub use guard::{classify, SqlClassification, MUTATING_KEYWORDS};
