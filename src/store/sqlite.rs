//! SQLite executor.
//!
//! One connection behind an async mutex. A transaction owns the lock from
//! `BEGIN` until `COMMIT`/`ROLLBACK`, so statements from other callers wait
//! until it ends. A transaction dropped while still open is rolled back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::{Number, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{trace, warn};

use super::{QueryOutput, RelationalExecutor, Row, StoreResult, Transaction};
use crate::sql::{Dialect, Statement};

/// rusqlite-backed [`RelationalExecutor`].
#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a batch of semicolon-separated statements, e.g. fixtures.
    pub async fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl RelationalExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn query(&self, statement: &Statement) -> StoreResult<QueryOutput> {
        let conn = self.conn.lock().await;
        run(&conn, statement)
    }

    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>> {
        let guard = self.conn.clone().lock_owned().await;
        guard.execute_batch("BEGIN")?;
        let id = uuid::Uuid::new_v4().to_string();
        trace!(transaction = %id, "transaction started");
        Ok(Box::new(SqliteTransaction {
            id,
            conn: Some(guard),
        }))
    }
}

struct SqliteTransaction {
    id: String,
    conn: Option<OwnedMutexGuard<Connection>>,
}

#[async_trait]
impl Transaction for SqliteTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    async fn query(&mut self, statement: &Statement) -> StoreResult<QueryOutput> {
        let conn = self.conn.as_ref().ok_or(super::StoreError::TransactionClosed)?;
        let output = run(conn, statement)?;
        if statement.is_transaction_end() {
            trace!(transaction = %self.id, "transaction ended");
            self.conn = None;
        }
        Ok(output)
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!(transaction = %self.id, "transaction dropped while open; rolling back");
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                warn!(transaction = %self.id, error = %e, "rollback on drop failed");
            }
        }
    }
}

fn run(conn: &Connection, statement: &Statement) -> StoreResult<QueryOutput> {
    let compiled = statement.compile(Dialect::Sqlite);
    trace!(sql = %compiled.sql, params = compiled.params.len(), "executing statement");

    let mut prepared = conn.prepare(&compiled.sql)?;
    let params: Vec<SqlValue> = compiled.params.iter().map(to_sql_value).collect();

    if prepared.column_count() == 0 {
        let changed = prepared.execute(rusqlite::params_from_iter(params.iter()))?;
        return Ok(QueryOutput {
            row_count: changed as u64,
            rows: Vec::new(),
        });
    }

    let names: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = prepared.query(rusqlite::params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, name) in names.iter().enumerate() {
            let value: SqlValue = row.get(i)?;
            record.insert(name.clone(), from_sql_value(value));
        }
        out.push(record);
    }
    Ok(QueryOutput::from_rows(out))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
    }
}
