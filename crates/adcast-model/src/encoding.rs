//! Categorical expansion shared by training and inference.
//!
//! A categorical field `ad_type` holding `"Video"` becomes the indicator column
//! `ad_type_Video` with value `1.0`. Training drops the lexicographically first
//! label of every categorical column from the schema; inference emits the
//! indicator for whatever label it sees and lets alignment drop it when it is
//! that reference label, so both sides produce the same vector.

use std::collections::BTreeMap;

use crate::error::AlignError;
use crate::value::{Record, Value};

/// Name of the indicator column for `label` in categorical `column`.
#[must_use]
pub fn indicator_column(column: &str, label: &str) -> String {
    format!("{column}_{label}")
}

/// Expand a single record into a sparse column-to-value map.
///
/// - fields listed in `numeric` are coerced to numbers;
/// - fields listed in `categorical` become one indicator set to `1.0`;
/// - any other text field also becomes an indicator;
/// - any other number or bool passes through unchanged.
///
/// Missing values produce no column.
///
/// # Errors
///
/// Returns [`AlignError::Coercion`] if a numeric field cannot be coerced.
pub fn expand_record(
    record: &Record,
    numeric: &[String],
    categorical: &[String],
) -> Result<BTreeMap<String, f64>, AlignError> {
    let mut expanded = BTreeMap::new();

    for (field, value) in record.iter() {
        if numeric.iter().any(|c| c == field) {
            if let Some(n) = value.coerce_number(field)? {
                expanded.insert(field.to_string(), n);
            }
            continue;
        }

        if categorical.iter().any(|c| c == field) {
            if let Some(label) = value.category_label() {
                expanded.insert(indicator_column(field, &label), 1.0);
            }
            continue;
        }

        match value {
            Value::Number(n) => {
                expanded.insert(field.to_string(), *n);
            }
            Value::Bool(b) => {
                expanded.insert(field.to_string(), if *b { 1.0 } else { 0.0 });
            }
            Value::Text(_) => {
                if let Some(label) = value.category_label() {
                    expanded.insert(indicator_column(field, &label), 1.0);
                }
            }
            Value::Missing => {}
        }
    }

    Ok(expanded)
}
