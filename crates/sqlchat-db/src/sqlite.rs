//! SQLite-backed schema provider and query executor.
//!
//! Schema text is the database's own `CREATE TABLE` DDL, which is the
//! rendering the question prompt embeds. Execution is a passthrough: the
//! statement runs as-is and syntax errors from malformed generated SQL come
//! back as ordinary `DbError`s for the retry loop.

use crate::error::DbError;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sqlchat_core::QueryResult;
use std::path::Path;
use std::sync::Mutex;

pub trait SchemaProvider: Send + Sync {
    fn schema_text(&self) -> Result<String, DbError>;
}

pub trait QueryExecutor: Send + Sync {
    fn execute(&self, sql: &str) -> Result<QueryResult, DbError>;
}

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means another statement panicked mid-query; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SchemaProvider for SqliteDatabase {
    fn schema_text(&self) -> Result<String, DbError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT sql FROM sqlite_master \
             WHERE type IN ('table', 'view') \
               AND name NOT LIKE 'sqlite_%' \
               AND sql IS NOT NULL \
             ORDER BY name",
        )?;

        let statements: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        if statements.is_empty() {
            return Err(DbError::Schema("database contains no tables".to_string()));
        }

        Ok(statements
            .into_iter()
            .map(|ddl| {
                let ddl = ddl.trim_end().to_string();
                if ddl.ends_with(';') {
                    ddl
                } else {
                    format!("{ddl};")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

impl QueryExecutor for SqliteDatabase {
    fn execute(&self, sql: &str) -> Result<QueryResult, DbError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(render_value(row.get_ref(index)?));
            }
            collected.push(values);
        }

        log::debug!("query returned {} rows, {} columns", collected.len(), column_count);
        Ok(QueryResult::new(columns, collected))
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(blob) => format!("<blob {} bytes>", blob.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        {
            let conn = db.lock();
            conn.execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);
                 CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id), total REAL);
                 INSERT INTO users VALUES (1, 'ada', 36), (2, 'grace', NULL);
                 INSERT INTO orders VALUES (10, 1, 19.5);",
            )
            .unwrap();
        }
        db
    }

    #[test]
    fn schema_text_renders_create_table_statements() {
        let db = sample_db();
        let schema = db.schema_text().unwrap();
        assert!(schema.contains("CREATE TABLE users"));
        assert!(schema.contains("CREATE TABLE orders"));
        assert!(schema.contains("REFERENCES users(id)"));
        assert!(schema.ends_with(';'));
    }

    #[test]
    fn empty_database_is_a_schema_error() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(matches!(db.schema_text(), Err(DbError::Schema(_))));
    }

    #[test]
    fn execute_returns_rows_and_header() {
        let db = sample_db();
        let result = db.execute("SELECT name, age FROM users ORDER BY id").unwrap();
        assert_eq!(result.columns, vec!["name", "age"]);
        assert_eq!(result.rows, vec![vec!["ada", "36"], vec!["grace", "NULL"]]);
    }

    #[test]
    fn execute_handles_joins_and_empty_results() {
        let db = sample_db();
        let result = db
            .execute(
                "SELECT u.name, o.total FROM users u \
                 JOIN orders o ON o.user_id = u.id WHERE o.total > 100",
            )
            .unwrap();
        assert_eq!(result.columns, vec!["name", "total"]);
        assert!(result.is_empty());
    }

    #[test]
    fn file_backed_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");

        {
            let db = SqliteDatabase::open(&path).unwrap();
            let conn = db.lock();
            conn.execute_batch(
                "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);
                 INSERT INTO notes VALUES (1, 'kept');",
            )
            .unwrap();
        }

        let db = SqliteDatabase::open(&path).unwrap();
        let result = db.execute("SELECT body FROM notes").unwrap();
        assert_eq!(result.rows, vec![vec!["kept"]]);
    }

    #[test]
    fn malformed_sql_surfaces_as_sqlite_error() {
        let db = sample_db();
        let err = db.execute("SELEC wrong FROM nowhere").unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }
}
