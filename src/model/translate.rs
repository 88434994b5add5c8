use crate::metadata::Metadata;

use super::FieldValues;

/// Map logical field names to physical column names.
///
/// Unknown keys are dropped and known keys renamed to their column. In
/// strict mode, or when the model declares no columns, the payload passes
/// through unchanged.
pub fn translate_fields(metadata: &Metadata, strict_mode: bool, fields: &FieldValues) -> FieldValues {
    if strict_mode || metadata.columns().is_empty() {
        return fields.clone();
    }

    metadata
        .columns()
        .iter()
        .filter_map(|column| {
            fields
                .get(&column.field)
                .map(|value| (column.column_name.clone(), value.clone()))
        })
        .collect()
}
