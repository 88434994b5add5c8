//! In-memory executor for tests.
//!
//! [`RecordingExecutor`] records every statement it receives, including
//! `BEGIN`, `COMMIT` and `ROLLBACK`, and answers data statements from a FIFO
//! of scripted responses. An empty script answers with an empty output.
//! Control statements never consume a scripted response.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{QueryOutput, RelationalExecutor, Row, StoreError, StoreResult, Transaction};
use crate::sql::{CompiledStatement, Dialect, Statement, StatementKind};

/// A statement as seen by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    /// Transaction the statement ran in, if any.
    pub transaction: Option<String>,
    pub statement: Statement,
    pub compiled: CompiledStatement,
}

impl RecordedStatement {
    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }
}

enum Scripted {
    Output(QueryOutput),
    Error(StoreError),
}

#[derive(Default)]
struct State {
    log: Vec<RecordedStatement>,
    script: VecDeque<Scripted>,
    transactions: usize,
}

/// Recording test double for [`RelationalExecutor`].
#[derive(Clone)]
pub struct RecordingExecutor {
    dialect: Dialect,
    state: Arc<Mutex<State>>,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new(Dialect::Postgres)
    }
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Queue an output for the next data statement.
    pub fn push_output(&self, output: QueryOutput) -> &Self {
        self.state().script.push_back(Scripted::Output(output));
        self
    }

    /// Queue rows given as JSON objects. The row count is the number of rows.
    pub fn push_rows(&self, rows: impl IntoIterator<Item = Value>) -> &Self {
        self.push_output(QueryOutput::from_rows(to_rows(rows)))
    }

    /// Queue rows with an explicit row count.
    pub fn push_rows_with_count(
        &self,
        rows: impl IntoIterator<Item = Value>,
        row_count: u64,
    ) -> &Self {
        self.push_output(QueryOutput {
            row_count,
            rows: to_rows(rows),
        })
    }

    /// Queue a failure for the next data statement.
    pub fn push_error(&self, error: StoreError) -> &Self {
        self.state().script.push_back(Scripted::Error(error));
        self
    }

    /// Every statement received so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().log.clone()
    }

    /// Compiled SQL of every statement received so far.
    pub fn sql_log(&self) -> Vec<String> {
        self.state()
            .log
            .iter()
            .map(|r| r.compiled.sql.clone())
            .collect()
    }

    /// Number of transactions opened.
    pub fn transactions_started(&self) -> usize {
        self.state().transactions
    }

    /// Scripted responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.state().script.len()
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn to_rows(rows: impl IntoIterator<Item = Value>) -> Vec<Row> {
    rows.into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            other => {
                let mut row = Row::new();
                row.insert("value".into(), other);
                row
            }
        })
        .collect()
}

fn record(
    state: &Mutex<State>,
    dialect: Dialect,
    transaction: Option<&str>,
    statement: &Statement,
) -> StoreResult<QueryOutput> {
    let mut state = lock(state);
    state.log.push(RecordedStatement {
        transaction: transaction.map(String::from),
        statement: statement.clone(),
        compiled: statement.compile(dialect),
    });
    if matches!(statement, Statement::Raw(_)) {
        return Ok(QueryOutput::default());
    }
    match state.script.pop_front() {
        Some(Scripted::Output(output)) => Ok(output),
        Some(Scripted::Error(err)) => Err(err),
        None => Ok(QueryOutput::default()),
    }
}

#[async_trait]
impl RelationalExecutor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn query(&self, statement: &Statement) -> StoreResult<QueryOutput> {
        record(&self.state, self.dialect, None, statement)
    }

    async fn begin_transaction(&self) -> StoreResult<Box<dyn Transaction>> {
        let id = {
            let mut state = self.state();
            state.transactions += 1;
            format!("tx-{}", state.transactions)
        };
        record(&self.state, self.dialect, Some(&id), &Statement::begin())?;
        Ok(Box::new(RecordingTransaction {
            id,
            dialect: self.dialect,
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct RecordingTransaction {
    id: String,
    dialect: Dialect,
    state: Arc<Mutex<State>>,
    closed: bool,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    fn id(&self) -> &str {
        &self.id
    }

    async fn query(&mut self, statement: &Statement) -> StoreResult<QueryOutput> {
        if self.closed {
            return Err(StoreError::TransactionClosed);
        }
        let output = record(&self.state, self.dialect, Some(&self.id), statement)?;
        if statement.is_transaction_end() {
            self.closed = true;
        }
        Ok(output)
    }
}
