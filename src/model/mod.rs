//! Model handles and CRUD execution.
//!
//! A [`Model`] binds cached [`Metadata`] to an executor and a set of globals.
//! It translates logical field names to physical columns, builds the
//! statement for each operation and runs it.
//!
//! # Example
//!
//! ```ignore
//! let model = registry.get_model("customers").await?;
//!
//! let rows = model.select(json!({"status": "active"})).await?;
//! let created = model.insert(&fields(json!({"id": 7, "status": "new"}))).await?;
//! let updated = model
//!     .update(&UpdateValues::new(fields(json!({"id": 7})), fields(json!({"status": "x"}))))
//!     .await?;
//! ```
//!
//! Update and delete run in a transaction that rolls back when more than one
//! row is affected.

mod condition;
mod transaction;
mod translate;

pub use condition::build_condition;
pub use transaction::execute_single_row;
pub use translate::translate_fields;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::error::{ModelError, ModelResult};
use crate::filter::{self, Filters};
use crate::metadata::{Metadata, Operation, Permissions, SelectSource};
use crate::sql::{col, param, star, Delete, Expr, ExprExt, FromSource, Insert, Query, Statement, Update};
use crate::store::{RelationalExecutor, Row};

/// Logical field name to value.
pub type FieldValues = serde_json::Map<String, Value>;

/// Caller-supplied substitutions for raw query text.
pub type Globals = HashMap<String, String>;

/// Alias of the derived table wrapping a raw query.
pub const RAW_QUERY_ALIAS: &str = "qry";

/// Result of [`Model::select`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectResult {
    pub rows: u64,
    pub data: Vec<Row>,
}

/// Result of [`Model::insert`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertResult {
    /// First returned row.
    pub data: Option<Row>,
}

/// Result of [`Model::update`] and [`Model::delete`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    /// First returned row.
    pub data: Option<Row>,
    /// Whether a row matched.
    pub found: bool,
}

/// Values for [`Model::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValues {
    /// Identify the row: conjunctive equality.
    pub old_values: FieldValues,
    /// Columns to set.
    pub new_values: FieldValues,
}

impl UpdateValues {
    pub fn new(old_values: FieldValues, new_values: FieldValues) -> Self {
        Self {
            old_values,
            new_values,
        }
    }
}

/// A handle on one model.
#[derive(Clone)]
pub struct Model {
    name: String,
    metadata: Arc<Metadata>,
    executor: Arc<dyn RelationalExecutor>,
    globals: Globals,
    strict_mode: bool,
    enforce_permissions: bool,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("table", &self.metadata.table())
            .field("strict_mode", &self.strict_mode)
            .field("enforce_permissions", &self.enforce_permissions)
            .finish()
    }
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        metadata: Arc<Metadata>,
        executor: Arc<dyn RelationalExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            metadata,
            executor,
            globals: Globals::new(),
            strict_mode: false,
            enforce_permissions: false,
        }
    }

    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    /// Pass field maps through without translation.
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Fail operations whose permission flag is off.
    pub fn with_permission_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_permissions = enforce;
        self
    }

    pub fn set_strict_mode(&mut self, strict_mode: bool) {
        self.strict_mode = strict_mode;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn permissions(&self) -> Permissions {
        self.metadata.permissions()
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Translate logical field names with this model's metadata.
    pub fn translate(&self, fields: &FieldValues) -> FieldValues {
        translate_fields(&self.metadata, self.strict_mode, fields)
    }

    fn authorize(&self, operation: Operation) -> ModelResult<()> {
        if self.enforce_permissions && !self.metadata.permissions().allows(operation) {
            error!(model = %self.name, %operation, "operation not permitted");
            return Err(ModelError::PermissionDenied {
                model: self.name.clone(),
                operation,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Build the select statement for optional filters.
    pub fn select_statement(&self, filters: Option<Filters>) -> ModelResult<Statement> {
        let projection: Vec<_> = self
            .metadata
            .columns()
            .iter()
            .map(|c| col(&c.column_name).alias(&c.field))
            .collect();

        let source = match self.metadata.source() {
            SelectSource::Table => FromSource::Table(self.metadata.qualified_table()),
            SelectSource::Raw(raw) => {
                trace!(model = %self.name, sql = raw.text(), globals = ?self.globals, "raw query source");
                let body = raw.bind(&self.globals).map_err(|unbound| {
                    error!(model = %self.name, global = %unbound.0, "raw query references undefined global");
                    ModelError::MissingGlobal(unbound.0)
                })?;
                FromSource::Derived {
                    body,
                    alias: RAW_QUERY_ALIAS.to_string(),
                }
            }
        };

        let mut query = Query::new().select(projection).from(source);

        if let Some(filters) = filters {
            let predicates = filter::normalize(filters).map_err(|e| {
                error!(model = %self.name, error = %e, "invalid filter");
                ModelError::from(e)
            })?;
            for predicate in &predicates {
                query = query.filter(build_condition(&self.metadata, predicate)?);
            }
        }

        if let Some(limit) = self.metadata.row_limit() {
            query = query.limit(limit);
        }

        Ok(query.into())
    }

    /// Build the insert statement.
    pub fn insert_statement(&self, values: &FieldValues) -> Statement {
        let fields = self.translate(values);
        let table = self.metadata.qualified_table();

        let mut insert = Insert::into(table.table.clone());
        if let Some(schema) = table.schema {
            insert = insert.schema(schema);
        }
        if !fields.is_empty() {
            insert = insert
                .columns(fields.keys().cloned())
                .values(fields.into_iter().map(|(_, v)| param(v)));
        }
        insert.returning([star()]).into()
    }

    /// Build the update statement.
    pub fn update_statement(&self, values: &UpdateValues) -> ModelResult<Statement> {
        let new_values = self.translate(&values.new_values);
        if new_values.is_empty() {
            error!(model = %self.name, "update has no known fields to set");
            return Err(ModelError::NothingToUpdate);
        }
        let table = self.metadata.qualified_table();

        let mut update = Update::table(table.table.clone());
        if let Some(schema) = table.schema {
            update = update.schema(schema);
        }
        for (column, value) in new_values {
            update = update.set(column, param(value));
        }
        if let Some(filter) = self.key_filter(&values.old_values) {
            update = update.filter(filter);
        }
        Ok(update.returning([star()]).into())
    }

    /// Build the delete statement.
    pub fn delete_statement(&self, values: &FieldValues) -> Statement {
        let table = self.metadata.qualified_table();

        let mut delete = Delete::from(table.table.clone());
        if let Some(schema) = table.schema {
            delete = delete.schema(schema);
        }
        if let Some(filter) = self.key_filter(values) {
            delete = delete.filter(filter);
        }
        delete.returning([star()]).into()
    }

    /// Conjunctive equality on translated values. Null compares with IS NULL.
    fn key_filter(&self, values: &FieldValues) -> Option<Expr> {
        self.translate(values)
            .into_iter()
            .map(|(column, value)| match value {
                Value::Null => col(&column).is_null(),
                value => col(&column).eq(param(value)),
            })
            .reduce(|acc, cond| acc.and(cond))
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Select rows. Filters may be JSON text, decoded JSON, a list or a map.
    pub async fn select(&self, filters: impl Into<Filters>) -> ModelResult<SelectResult> {
        self.run_select(Some(filters.into())).await
    }

    /// Select rows without filters.
    pub async fn select_all(&self) -> ModelResult<SelectResult> {
        self.run_select(None).await
    }

    async fn run_select(&self, filters: Option<Filters>) -> ModelResult<SelectResult> {
        self.authorize(Operation::Select)?;
        let statement = self.select_statement(filters)?;
        debug!(
            model = %self.name,
            sql = %statement.to_sql(self.executor.dialect()),
            "running database query"
        );

        let output = self.executor.query(&statement).await.map_err(|e| {
            error!(model = %self.name, error = %e, "select failed");
            e
        })?;
        trace!(model = %self.name, rows = output.row_count, "select result");

        Ok(SelectResult {
            rows: output.row_count,
            data: output.rows,
        })
    }

    /// Insert one row and return it.
    pub async fn insert(&self, values: &FieldValues) -> ModelResult<InsertResult> {
        self.authorize(Operation::Insert)?;
        let statement = self.insert_statement(values);
        debug!(model = %self.name, "inserting into database");

        let output = self.executor.query(&statement).await.map_err(|e| {
            error!(model = %self.name, error = %e, "insert failed");
            e
        })?;
        trace!(model = %self.name, rows = output.row_count, "insert result");

        Ok(InsertResult {
            data: output.rows.into_iter().next(),
        })
    }

    /// Update at most one row.
    pub async fn update(&self, values: &UpdateValues) -> ModelResult<MutationResult> {
        self.authorize(Operation::Update)?;
        let statement = self.update_statement(values)?;
        debug!(model = %self.name, "updating database row");
        self.mutate(&statement).await
    }

    /// Delete at most one row.
    pub async fn delete(&self, values: &FieldValues) -> ModelResult<MutationResult> {
        self.authorize(Operation::Delete)?;
        let statement = self.delete_statement(values);
        debug!(model = %self.name, "deleting database row");
        self.mutate(&statement).await
    }

    async fn mutate(&self, statement: &Statement) -> ModelResult<MutationResult> {
        let output = execute_single_row(self.executor.as_ref(), statement).await?;
        trace!(model = %self.name, rows = output.row_count, "mutation result");
        Ok(MutationResult {
            found: output.row_count > 0,
            data: output.rows.into_iter().next(),
        })
    }
}
