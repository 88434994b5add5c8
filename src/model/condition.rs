//! Predicate to WHERE condition.

use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::filter::{FilterPredicate, Operator};
use crate::metadata::Metadata;
use crate::sql::{col, raw_sql, BinaryOperator, Expr, ExprExt};

/// Build the condition for one normalized predicate.
///
/// The column resolves through the field lookup when the name is a known
/// field, else it is used as given (aliases from a raw query).
pub fn build_condition(metadata: &Metadata, predicate: &FilterPredicate) -> ModelResult<Expr> {
    let name = predicate
        .column
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ModelError::InvalidFilterSyntax("predicate has no column".into()))?;
    let column = metadata
        .field(name)
        .map(|f| f.column_name.as_str())
        .unwrap_or(name);
    let target = col(column);

    // SECURITY: a function-wrapped value is interpolated into the query
    // text, not bound. Callers must not pass untrusted input through
    // `function`/`value` together.
    let wrapped = predicate.function.as_deref().map(|function| {
        raw_sql(&format!("{}('{}')", function, value_text(predicate.value.as_ref())))
    });
    let operand = || {
        wrapped
            .clone()
            .unwrap_or_else(|| Expr::Param(predicate.value.clone().unwrap_or(Value::Null)))
    };
    let compare = |op: BinaryOperator| target.clone().binary(op, operand());

    let condition = match predicate.operator {
        Operator::In | Operator::NotIn => {
            let values = match &predicate.multiple_values {
                Some(values) => values.iter().cloned().map(Expr::Param).collect(),
                None => vec![operand()],
            };
            if predicate.operator == Operator::In {
                target.in_list(values)
            } else {
                target.not_in_list(values)
            }
        }
        Operator::Between | Operator::NotBetween => {
            let bounds = predicate.multiple_values.as_deref().unwrap_or_default();
            let [low, high] = bounds else {
                return Err(ModelError::InvalidBoundsList {
                    column: name.to_string(),
                    operator: predicate.operator,
                    len: bounds.len(),
                });
            };
            let (low, high) = (Expr::Param(low.clone()), Expr::Param(high.clone()));
            if predicate.operator == Operator::Between {
                target.between(low, high)
            } else {
                target.not_between(low, high)
            }
        }
        Operator::IsNull => target.is_null(),
        Operator::IsNotNull => target.is_not_null(),
        Operator::Eq => compare(BinaryOperator::Eq),
        Operator::Ne => compare(BinaryOperator::Ne),
        Operator::Gt => compare(BinaryOperator::Gt),
        Operator::Lt => compare(BinaryOperator::Lt),
        Operator::Gte => compare(BinaryOperator::Gte),
        Operator::Lte => compare(BinaryOperator::Lte),
        Operator::Like => compare(BinaryOperator::Like),
    };

    Ok(condition)
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
