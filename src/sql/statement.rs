//! Statements handed to the relational executor.
//!
//! A [`Statement`] is the structured query description a model produces.
//! Executors compile it for their dialect into SQL text plus an ordered
//! parameter list.

use serde_json::Value;

use super::dialect::Dialect;
use super::dml::{Delete, Insert, Update};
use super::query::Query;
use super::token::{Token, TokenStream};

/// A structured query description.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Query),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    /// Control or fixture text sent as-is (`BEGIN`, `COMMIT`, `ROLLBACK`).
    Raw(String),
}

/// The kind of a statement, for logging and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

/// SQL text with placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn begin() -> Self {
        Statement::Raw("BEGIN".into())
    }

    pub fn commit() -> Self {
        Statement::Raw("COMMIT".into())
    }

    pub fn rollback() -> Self {
        Statement::Raw("ROLLBACK".into())
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Select(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::Raw(_) => StatementKind::Raw,
        }
    }

    /// `COMMIT` or `ROLLBACK`, compared case-insensitively.
    pub fn is_transaction_end(&self) -> bool {
        match self {
            Statement::Raw(text) => {
                let text = text.trim();
                text.eq_ignore_ascii_case("COMMIT") || text.eq_ignore_ascii_case("ROLLBACK")
            }
            _ => false,
        }
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        match self {
            Statement::Select(q) => q.to_tokens_for_dialect(dialect),
            Statement::Insert(i) => i.to_tokens(dialect),
            Statement::Update(u) => u.to_tokens(dialect),
            Statement::Delete(d) => d.to_tokens(dialect),
            Statement::Raw(text) => {
                let mut ts = TokenStream::new();
                ts.push(Token::Raw(text.clone()));
                ts
            }
        }
    }

    /// Render with parameters inlined. For logs and snapshots only.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Compile to executable SQL with placeholders.
    pub fn compile(&self, dialect: Dialect) -> CompiledStatement {
        let (sql, params) = self.to_tokens(dialect).compile(dialect);
        CompiledStatement { sql, params }
    }
}

impl From<Query> for Statement {
    fn from(q: Query) -> Self {
        Statement::Select(q)
    }
}

impl From<Insert> for Statement {
    fn from(i: Insert) -> Self {
        Statement::Insert(i)
    }
}

impl From<Update> for Statement {
    fn from(u: Update) -> Self {
        Statement::Update(u)
    }
}

impl From<Delete> for Statement {
    fn from(d: Delete) -> Self {
        Statement::Delete(d)
    }
}
