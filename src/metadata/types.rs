//! Model metadata types.
//!
//! [`Metadata`] is always built from a [`MetadataRecord`]. The field lookup,
//! the primary-key list and the select source are derived once during that
//! conversion and cannot be mutated on their own. Serialization goes through
//! the record as well, so a cached value is re-derived when read back.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql::{RawQuery, TableRef};

/// Description of one model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Logical field name.
    pub field: String,
    /// Declared type.
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    /// Whether the field belongs to the base table or comes from the raw query.
    #[serde(default)]
    pub base_table: bool,
    /// Physical column name.
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default)]
    pub primary_key: bool,
    /// Display hint: value should be shown uppercased.
    #[serde(default)]
    pub uppercase: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldDescriptor {
    /// A field whose column name equals its field name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            column_name: field.clone(),
            field,
            field_type: String::new(),
            required: false,
            base_table: false,
            max_length: None,
            primary_key: false,
            uppercase: false,
            default_value: None,
        }
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    pub fn field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Per-operation permission flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub select: bool,
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            select: true,
            insert: true,
            update: true,
            delete: true,
        }
    }

    pub fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Select => self.select,
            Operation::Insert => self.insert,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// A model operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// Where select reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectSource {
    /// The physical table.
    Table,
    /// Raw query text with named substitutions.
    Raw(RawQuery),
}

/// Stored form of model metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    /// Raw query text overriding the table for select.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub columns: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u64>,
}

impl MetadataRecord {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn column(mut self, field: FieldDescriptor) -> Self {
        self.columns.push(field);
        self
    }

    pub fn row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }
}

/// Consolidated description of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetadataRecord", into = "MetadataRecord")]
pub struct Metadata {
    schema: Option<String>,
    table: String,
    source: SelectSource,
    permissions: Permissions,
    columns: Vec<FieldDescriptor>,
    field_index: HashMap<String, usize>,
    primary_key: Vec<String>,
    row_limit: Option<u64>,
}

impl From<MetadataRecord> for Metadata {
    fn from(record: MetadataRecord) -> Self {
        let source = match record.sql.as_deref().map(str::trim) {
            Some(sql) if !sql.is_empty() => SelectSource::Raw(RawQuery::parse(sql)),
            _ => SelectSource::Table,
        };

        // Later duplicates replace earlier ones.
        let field_index = record
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.field.clone(), i))
            .collect();

        let primary_key = record
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.field.clone())
            .collect();

        Self {
            schema: record.schema.filter(|s| !s.is_empty()),
            table: record.table,
            source,
            permissions: record.permissions,
            columns: record.columns,
            field_index,
            primary_key,
            row_limit: record.row_limit,
        }
    }
}

impl From<Metadata> for MetadataRecord {
    fn from(metadata: Metadata) -> Self {
        let sql = match metadata.source {
            SelectSource::Raw(raw) => Some(raw.text().to_string()),
            SelectSource::Table => None,
        };
        Self {
            schema: metadata.schema,
            table: metadata.table,
            sql,
            permissions: metadata.permissions,
            columns: metadata.columns,
            row_limit: metadata.row_limit,
        }
    }
}

impl Metadata {
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Target of insert, update and delete: the schema-qualified table,
    /// lower-cased. The schema keeps its case.
    pub fn qualified_table(&self) -> TableRef {
        let table = TableRef::new(&self.table.to_lowercase());
        match &self.schema {
            Some(schema) => table.with_schema(schema),
            None => table,
        }
    }

    pub fn source(&self) -> &SelectSource {
        &self.source
    }

    pub fn raw_query(&self) -> Option<&RawQuery> {
        match &self.source {
            SelectSource::Raw(raw) => Some(raw),
            SelectSource::Table => None,
        }
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn columns(&self) -> &[FieldDescriptor] {
        &self.columns
    }

    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index.get(name).map(|&i| &self.columns[i])
    }

    /// Number of distinct field names.
    pub fn field_count(&self) -> usize {
        self.field_index.len()
    }

    /// Fields flagged as primary key, in column order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn row_limit(&self) -> Option<u64> {
        self.row_limit
    }

    /// Field names that occur more than once in the column list.
    pub fn duplicate_fields(&self) -> Vec<&str> {
        let mut seen = HashMap::new();
        for column in &self.columns {
            *seen.entry(column.field.as_str()).or_insert(0usize) += 1;
        }
        let mut duplicates: Vec<&str> = seen
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name)
            .collect();
        duplicates.sort_unstable();
        duplicates
    }
}
