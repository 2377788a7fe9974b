pub mod error;
pub mod format;
pub mod sqlite;

pub use error::DbError;
pub use format::format_table;
pub use sqlite::{QueryExecutor, SchemaProvider, SqliteDatabase};
