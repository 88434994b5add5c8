//! Relational execution capability.
//!
//! Models never talk to a database directly. They hand a [`Statement`] to a
//! [`RelationalExecutor`] and get back a [`QueryOutput`]. Mutations run on a
//! [`Transaction`] obtained from the executor and are ended by sending
//! `COMMIT` or `ROLLBACK` through it.
//!
//! Two implementations ship with the crate:
//!
//! - [`SqliteExecutor`] - rusqlite-backed, with real transactions
//! - [`testing::RecordingExecutor`] - records statements and replays scripted outputs

mod error;
mod sqlite;
pub mod testing;

pub use error::{StoreError, StoreResult, SQLSTATE_UNDEFINED_TABLE};
pub use sqlite::SqliteExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql::{Dialect, Statement};

/// A returned row, keyed by column (or alias) name.
pub type Row = serde_json::Map<String, Value>;

/// Result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    /// Rows matched or affected.
    pub row_count: u64,
    /// Rows returned by the statement, if any.
    pub rows: Vec<Row>,
}

impl QueryOutput {
    /// Output whose row count is the number of returned rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            row_count: rows.len() as u64,
            rows,
        }
    }
}

/// Executes statements against a relational store.
#[async_trait]
pub trait RelationalExecutor: Send + Sync {
    /// Dialect statements are compiled for.
    fn dialect(&self) -> Dialect;

    /// Execute a statement outside any transaction.
    async fn query(&self, statement: &Statement) -> StoreResult<QueryOutput>;

    /// Open a transaction.
    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>>;
}

/// An open transaction handle.
///
/// Sending `COMMIT` or `ROLLBACK` through [`Transaction::query`] closes it.
/// Further statements fail with [`StoreError::TransactionClosed`].
#[async_trait]
pub trait Transaction: Send {
    /// Identifier for logging.
    fn id(&self) -> &str;

    /// Execute a statement scoped to this transaction.
    async fn query(&mut self, statement: &Statement) -> StoreResult<QueryOutput>;

    async fn commit(&mut self) -> StoreResult<()> {
        self.query(&Statement::commit()).await.map(|_| ())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        self.query(&Statement::rollback()).await.map(|_| ())
    }
}
