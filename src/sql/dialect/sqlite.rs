//! SQLite SQL dialect.
//!
//! SQLite accepts ANSI double-quoted identifiers, `?` placeholders and
//! (since 3.35) a RETURNING clause on INSERT/UPDATE/DELETE. Booleans are
//! stored as integers.

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_positional(index)
    }
}
