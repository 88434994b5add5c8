//! Metadata resolution from the control schema.
//!
//! Two control tables describe every model:
//!
//! - the header table (`models`): one row per model, keyed by `id_model`
//!   (uppercase), with `schema_name`, `table_name`, `sql`, the permission
//!   flags `sel`/`ins`/`upd`/`del` and `row_limit`
//! - the columns table (`models_det`): one row per field, keyed by the same
//!   `id_model`, with `field`, `column_name`, `type`, `required`,
//!   `base_table`, `primary_key`, `uppercase`, `length` and `default_value`
//!
//! Flags are single characters; only `'Y'` is true.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, trace, warn};

use super::types::{FieldDescriptor, Metadata, MetadataRecord, Permissions};
use crate::error::{ModelError, ModelResult};
use crate::sql::{col, param, ExprExt, Query, Statement, TableRef};
use crate::store::{QueryOutput, RelationalExecutor, Row};

/// Names of the control tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSchema {
    pub schema: Option<String>,
    pub header_table: String,
    pub columns_table: String,
}

impl Default for ControlSchema {
    fn default() -> Self {
        Self {
            schema: None,
            header_table: "models".to_string(),
            columns_table: "models_det".to_string(),
        }
    }
}

impl ControlSchema {
    fn table(&self, name: &str) -> TableRef {
        let table = TableRef::new(name);
        match &self.schema {
            Some(schema) => table.with_schema(schema),
            None => table,
        }
    }

    fn lookup(&self, table: &str, model_id: &str) -> Statement {
        Query::new()
            .from(self.table(table))
            .filter(col("id_model").eq(param(model_id)))
            .into()
    }
}

/// Produces metadata for a model name.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resolve(&self, model_name: &str) -> ModelResult<Metadata>;
}

/// [`MetadataSource`] reading the control tables through an executor.
pub struct MetadataResolver {
    executor: Arc<dyn RelationalExecutor>,
    control: ControlSchema,
}

impl MetadataResolver {
    pub fn new(executor: Arc<dyn RelationalExecutor>) -> Self {
        Self::with_control_schema(executor, ControlSchema::default())
    }

    pub fn with_control_schema(executor: Arc<dyn RelationalExecutor>, control: ControlSchema) -> Self {
        Self { executor, control }
    }

    pub fn control_schema(&self) -> &ControlSchema {
        &self.control
    }

    async fn fetch(&self, table: &str, model_id: &str) -> ModelResult<QueryOutput> {
        let statement = self.control.lookup(table, model_id);
        match self.executor.query(&statement).await {
            Ok(output) => Ok(output),
            Err(err) if err.is_undefined_table() => {
                error!(
                    table,
                    "model database tables are not configured; create the {} and {} tables",
                    self.control.header_table,
                    self.control.columns_table
                );
                Err(ModelError::ModelStoreNotConfigured)
            }
            Err(err) => {
                error!(table, error = %err, "unhandled error when looking for model tables");
                Err(err.into())
            }
        }
    }

    async fn fetch_header(&self, model_name: &str, model_id: &str) -> ModelResult<MetadataRecord> {
        trace!(model = model_id, "fetching header metadata");
        let output = self.fetch(&self.control.header_table, model_id).await?;
        trace!(model = model_id, rows = output.row_count, "header query result");

        let Some(row) = output.rows.first() else {
            error!(model = model_name, "model not found");
            return Err(ModelError::ModelNotFound(model_name.to_string()));
        };

        let table = text(row, "table_name").ok_or_else(|| ModelError::InvalidMetadata {
            model: model_id.to_string(),
            reason: "header row has no table_name".into(),
        })?;

        Ok(MetadataRecord {
            schema: text(row, "schema_name"),
            table,
            sql: text(row, "sql"),
            permissions: Permissions {
                select: flag(row, "sel"),
                insert: flag(row, "ins"),
                update: flag(row, "upd"),
                delete: flag(row, "del"),
            },
            columns: Vec::new(),
            row_limit: number(row, "row_limit"),
        })
    }

    async fn fetch_columns(&self, model_id: &str) -> ModelResult<Vec<FieldDescriptor>> {
        trace!(model = model_id, "fetching column metadata");
        let output = self.fetch(&self.control.columns_table, model_id).await?;
        output
            .rows
            .iter()
            .map(|row| field_from_row(model_id, row))
            .collect()
    }
}

#[async_trait]
impl MetadataSource for MetadataResolver {
    async fn resolve(&self, model_name: &str) -> ModelResult<Metadata> {
        let model_id = model_name.to_uppercase();
        let mut record = self.fetch_header(model_name, &model_id).await?;
        record.columns = self.fetch_columns(&model_id).await?;

        let metadata = Metadata::from(record);
        for field in metadata.duplicate_fields() {
            warn!(model = %model_id, field, "duplicate field name in column metadata, last row wins");
        }
        debug!(
            model = %model_id,
            columns = metadata.columns().len(),
            "resolved model metadata"
        );
        Ok(metadata)
    }
}

fn field_from_row(model_id: &str, row: &Row) -> ModelResult<FieldDescriptor> {
    let field = text(row, "field").ok_or_else(|| ModelError::InvalidMetadata {
        model: model_id.to_string(),
        reason: "column row has no field".into(),
    })?;

    Ok(FieldDescriptor {
        column_name: text(row, "column_name").unwrap_or_else(|| field.clone()),
        field_type: text(row, "type").unwrap_or_default(),
        required: flag(row, "required"),
        base_table: flag(row, "base_table"),
        max_length: number(row, "length"),
        primary_key: flag(row, "primary_key"),
        uppercase: flag(row, "uppercase"),
        default_value: row.get("default_value").filter(|v| !v.is_null()).cloned(),
        field,
    })
}

fn flag(row: &Row, name: &str) -> bool {
    matches!(row.get(name), Some(Value::String(s)) if s == "Y")
}

/// Non-empty text; numbers are rendered.
fn text(row: &Row, name: &str) -> Option<String> {
    match row.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A non-negative integer stored as a number or numeric text.
fn number(row: &Row, name: &str) -> Option<u64> {
    match row.get(name)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
