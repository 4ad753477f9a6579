use serde::{Deserialize, Serialize};

use crate::align::FeatureVector;
use crate::error::ModelError;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// An ordinary-least-squares fit for one target metric.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    target: String,
    schema_fingerprint: String,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// # Errors
    ///
    /// Returns [`ModelError::Invalid`] if the target is blank, there are no
    /// coefficients, or any parameter is not finite.
    pub fn new(
        target: impl Into<String>,
        schema_fingerprint: impl Into<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(ModelError::Invalid("model target must be non-empty".to_string()));
        }
        if coefficients.is_empty() {
            return Err(ModelError::Invalid(format!(
                "model '{target}' has no coefficients"
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid(format!(
                "model '{target}' has non-finite parameters"
            )));
        }

        Ok(Self {
            target,
            schema_fingerprint: schema_fingerprint.into(),
            intercept,
            coefficients,
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn schema_fingerprint(&self) -> &str {
        &self.schema_fingerprint
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// `intercept + coefficients · vector`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the vector length differs from
    /// the coefficient count, or [`ModelError::SchemaMismatch`] if the vector
    /// was aligned to a different column order than the model was trained on.
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        if vector.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                target: self.target.clone(),
                expected: self.coefficients.len(),
                actual: vector.len(),
            });
        }
        if vector.schema().fingerprint() != self.schema_fingerprint {
            return Err(ModelError::SchemaMismatch {
                target: self.target.clone(),
                expected: self.schema_fingerprint.clone(),
                actual: vector.schema().fingerprint().to_string(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(vector.values())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }

    #[must_use]
    pub fn to_document(&self) -> ModelDocument {
        ModelDocument {
            format_version: MODEL_FORMAT_VERSION,
            target: self.target.clone(),
            schema_fingerprint: self.schema_fingerprint.clone(),
            intercept: self.intercept,
            coefficients: self.coefficients.clone(),
        }
    }
}

/// On-disk form of a [`LinearModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub format_version: u32,
    pub target: String,
    pub schema_fingerprint: String,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureSchema;

    fn schema(columns: &[&str]) -> FeatureSchema {
        FeatureSchema::new(
            columns.iter().map(|s| (*s).to_string()).collect(),
            vec![],
            vec![],
        )
        .expect("schema")
    }

    #[test]
    fn zero_vector_predicts_intercept() {
        let schema = schema(&["a", "b", "c"]);
        let model = LinearModel::new("purchase", schema.fingerprint(), 3.5, vec![1.0, -2.0, 0.5])
            .expect("model");
        let prediction = model.predict(&FeatureVector::zeros(&schema)).expect("predict");
        assert!((prediction - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_predictions_are_not_clamped() {
        let schema = schema(&["a"]);
        let model =
            LinearModel::new("click", schema.fingerprint(), -10.0, vec![0.0]).expect("model");
        let prediction = model.predict(&FeatureVector::zeros(&schema)).expect("predict");
        assert!(prediction < 0.0);
    }

    #[test]
    fn length_mismatch_is_shape_error() {
        let trained = schema(&["a", "b"]);
        let other = schema(&["a", "b", "c"]);
        let model =
            LinearModel::new("share", trained.fingerprint(), 0.0, vec![1.0, 1.0]).expect("model");
        let err = model.predict(&FeatureVector::zeros(&other)).unwrap_err();
        assert!(
            matches!(err, ModelError::ShapeMismatch { expected: 2, actual: 3, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn reordered_schema_is_schema_error() {
        let trained = schema(&["a", "b"]);
        let reordered = schema(&["b", "a"]);
        let model =
            LinearModel::new("share", trained.fingerprint(), 0.0, vec![1.0, 2.0]).expect("model");
        let err = model.predict(&FeatureVector::zeros(&reordered)).unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn new_rejects_non_finite_parameters() {
        assert!(LinearModel::new("click", "fp", f64::NAN, vec![1.0]).is_err());
        assert!(LinearModel::new("click", "fp", 0.0, vec![f64::INFINITY]).is_err());
        assert!(LinearModel::new("click", "fp", 0.0, vec![]).is_err());
        assert!(LinearModel::new(" ", "fp", 0.0, vec![1.0]).is_err());
    }
}
