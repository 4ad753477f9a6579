use crate::encoding::expand_record;
use crate::error::AlignError;
use crate::schema::FeatureSchema;
use crate::value::Record;

/// A dense feature vector laid out in [`FeatureSchema`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    /// An all-zero vector for `schema`.
    #[must_use]
    pub fn zeros(schema: &FeatureSchema) -> Self {
        Self {
            schema: schema.clone(),
            values: vec![0.0; schema.len()],
        }
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named schema column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.position(column).map(|i| self.values[i])
    }
}

/// Encode `request` and reindex it against `schema`.
///
/// Every schema column present in the expanded request is copied, every other
/// schema column is `0.0`, and expanded columns unknown to the schema are
/// dropped. The output depends only on the arguments.
///
/// # Errors
///
/// Returns [`AlignError::Coercion`] if a numeric field of the schema holds a
/// non-numeric value.
pub fn align(request: &Record, schema: &FeatureSchema) -> Result<FeatureVector, AlignError> {
    let expanded = expand_record(
        request,
        schema.numeric_columns(),
        schema.categorical_columns(),
    )?;

    let mut vector = FeatureVector::zeros(schema);
    let mut dropped = 0usize;
    for (column, value) in expanded {
        match schema.position(&column) {
            Some(i) => vector.values[i] = value,
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "request columns outside the feature schema dropped");
    }

    Ok(vector)
}
