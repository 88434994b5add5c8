//! Filter predicate normalization.
//!
//! Select filters arrive in several shapes: JSON text, a list of items, or a
//! mapping of column name to item. [`normalize`] turns any of them into an
//! ordered list of [`FilterPredicate`]s with the column and operator filled
//! in.
//!
//! An item is either a bare scalar (an equality on the surrounding column) or
//! a predicate object. A predicate object must carry at least one of
//! `value`, `multipleValues` or `operator`:
//!
//! ```json
//! {
//!   "status": "active",
//!   "age": { "operator": "BETWEEN", "multipleValues": ["18", "65"] },
//!   "name": { "function": "upper", "value": "smith" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Errors raised while normalizing filters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid filter syntax: {reason}")]
    InvalidFilterSyntax { reason: String },
}

pub type FilterResult<T> = Result<T, FilterError>;

fn invalid(reason: impl Into<String>) -> FilterError {
    FilterError::InvalidFilterSyntax {
        reason: reason.into(),
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "=" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Gte),
            "<=" => Ok(Operator::Lte),
            "LIKE" => Ok(Operator::Like),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "BETWEEN" => Ok(Operator::Between),
            "NOT BETWEEN" => Ok(Operator::NotBetween),
            "IS NULL" => Ok(Operator::IsNull),
            "IS NOT NULL" => Ok(Operator::IsNotNull),
            _ => Err(invalid(format!("unknown operator '{}'", s))),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = FilterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// A single select condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPredicate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_values: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "operator_or_default")]
    pub operator: Operator,
    /// Transform applied to `value`, rendered as `function('value')`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

fn operator_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<Operator, D::Error> {
    Ok(Option::<Operator>::deserialize(d)?.unwrap_or_default())
}

impl FilterPredicate {
    /// Equality predicate on `column`.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ..Self::default()
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.multiple_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Decode a predicate object.
    ///
    /// Key presence decides acceptance: `{"value": null}` is a predicate,
    /// `{"column": "a"}` is not.
    pub fn from_object(map: Map<String, Value>) -> FilterResult<Self> {
        if !["value", "multipleValues", "operator"]
            .iter()
            .any(|key| map.contains_key(*key))
        {
            return Err(invalid(
                "predicate needs at least one of value, multipleValues or operator",
            ));
        }
        serde_json::from_value(Value::Object(map)).map_err(|e| invalid(e.to_string()))
    }
}

// ============================================================================
// Input shapes
// ============================================================================

/// One filter entry: a bare scalar or a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterItem {
    Scalar(Value),
    Predicate(FilterPredicate),
}

impl FilterItem {
    /// Classify a decoded JSON value.
    pub fn from_json(value: Value) -> FilterResult<Self> {
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(FilterItem::Scalar(value)),
            Value::Object(map) => FilterPredicate::from_object(map).map(FilterItem::Predicate),
            Value::Null => Err(invalid("filter item is null")),
            Value::Array(_) => Err(invalid("filter item is a list")),
        }
    }
}

impl From<&str> for FilterItem {
    fn from(s: &str) -> Self {
        FilterItem::Scalar(Value::String(s.into()))
    }
}

impl From<String> for FilterItem {
    fn from(s: String) -> Self {
        FilterItem::Scalar(Value::String(s))
    }
}

impl From<FilterPredicate> for FilterItem {
    fn from(p: FilterPredicate) -> Self {
        FilterItem::Predicate(p)
    }
}

/// Filter input in any accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Filters {
    /// Serialized JSON, decoded then dispatched as a list or mapping.
    Text(String),
    /// Decoded JSON: an array or an object.
    Json(Value),
    List(Vec<FilterItem>),
    /// Column name to item; the key is the default column.
    Map(BTreeMap<String, FilterItem>),
}

impl From<&str> for Filters {
    fn from(s: &str) -> Self {
        Filters::Text(s.into())
    }
}

impl From<String> for Filters {
    fn from(s: String) -> Self {
        Filters::Text(s)
    }
}

impl From<Value> for Filters {
    fn from(v: Value) -> Self {
        Filters::Json(v)
    }
}

impl From<Vec<FilterItem>> for Filters {
    fn from(items: Vec<FilterItem>) -> Self {
        Filters::List(items)
    }
}

impl From<Vec<FilterPredicate>> for Filters {
    fn from(items: Vec<FilterPredicate>) -> Self {
        Filters::List(items.into_iter().map(FilterItem::Predicate).collect())
    }
}

impl From<BTreeMap<String, FilterItem>> for Filters {
    fn from(map: BTreeMap<String, FilterItem>) -> Self {
        Filters::Map(map)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalize filter input into an ordered predicate list.
pub fn normalize(filters: impl Into<Filters>) -> FilterResult<Vec<FilterPredicate>> {
    let filters = filters.into();
    debug!(?filters, "parsing filters");

    match filters {
        Filters::Text(text) if text.is_empty() => Ok(Vec::new()),
        Filters::Json(Value::Null) => Ok(Vec::new()),
        Filters::Text(text) => {
            let value: Value = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
            normalize_json(value)
        }
        Filters::Json(value) => normalize_json(value),
        Filters::List(items) => Ok(items.into_iter().map(|item| build(item, None)).collect()),
        Filters::Map(map) => Ok(map
            .into_iter()
            .map(|(column, item)| build(item, Some(column)))
            .collect()),
    }
}

fn normalize_json(value: Value) -> FilterResult<Vec<FilterPredicate>> {
    let mut predicates = Vec::new();
    match value {
        Value::Array(items) => {
            for item in items {
                predicates.push(build(FilterItem::from_json(item)?, None));
            }
        }
        Value::Object(map) => {
            for (column, item) in map {
                predicates.push(build(FilterItem::from_json(item)?, Some(column)));
            }
        }
        other => {
            return Err(invalid(format!(
                "expected a list or a mapping of filters, got {}",
                other
            )))
        }
    }
    Ok(predicates)
}

fn build(item: FilterItem, column: Option<String>) -> FilterPredicate {
    match item {
        FilterItem::Scalar(value) => FilterPredicate {
            column,
            value: Some(value),
            ..FilterPredicate::default()
        },
        FilterItem::Predicate(mut predicate) => {
            let unnamed = predicate.column.as_deref().map_or(true, str::is_empty);
            if unnamed && column.is_some() {
                predicate.column = column;
            }
            predicate
        }
    }
}
