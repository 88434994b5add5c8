//! SQL generation module.
//!
//! A type-safe SQL builder that generates multi-dialect SQL with bound
//! parameters. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`dml`] - Data Manipulation Language (INSERT, UPDATE, DELETE)
//! - [`raw`] - Raw query text with named substitutions
//! - [`statement`] - Executable statement descriptions
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod raw;
pub mod statement;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use dml::{Delete, Insert, Update};
pub use expr::{col, func, param, raw_sql, star, BinaryOperator, Expr, ExprExt};
pub use query::{FromSource, Query, SelectExpr, TableRef};
pub use raw::{RawPart, RawQuery, UnboundName};
pub use statement::{CompiledStatement, Statement, StatementKind};
pub use token::{Token, TokenStream};
