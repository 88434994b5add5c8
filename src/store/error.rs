//! Relational store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLSTATE reported by PostgreSQL for a missing relation.
pub const SQLSTATE_UNDEFINED_TABLE: &str = "42P01";

/// Errors reported by a relational executor.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The referenced relation does not exist.
    #[error("undefined table: {0}")]
    UndefinedTable(String),

    /// Any other failure reported by the database.
    #[error("database error: {message} (code: {code})")]
    Database {
        /// SQLSTATE or driver-specific code.
        code: String,
        /// Message from the database.
        message: String,
    },

    /// A returned row could not be decoded.
    #[error("failed to decode row: {0}")]
    Decode(String),

    /// The transaction was already committed or rolled back.
    #[error("transaction is already closed")]
    TransactionClosed,

    /// SQLite driver failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl StoreError {
    /// Build an error from a SQLSTATE code and message.
    pub fn from_sqlstate(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if code == SQLSTATE_UNDEFINED_TABLE {
            Self::UndefinedTable(message)
        } else {
            Self::Database { code, message }
        }
    }

    /// Check if this error reports a missing relation.
    pub fn is_undefined_table(&self) -> bool {
        matches!(self, Self::UndefinedTable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("no such table") => {
                Self::UndefinedTable(msg.clone())
            }
            _ => Self::Sqlite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_classification() {
        assert!(StoreError::from_sqlstate("42P01", "relation \"models\" does not exist")
            .is_undefined_table());
        let err = StoreError::from_sqlstate("23505", "duplicate key");
        assert!(!err.is_undefined_table());
        assert_eq!(err.to_string(), "database error: duplicate key (code: 23505)");
    }

    #[test]
    fn test_sqlite_missing_table() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: StoreError = conn.prepare("SELECT * FROM models").unwrap_err().into();
        assert!(err.is_undefined_table());
    }
}
