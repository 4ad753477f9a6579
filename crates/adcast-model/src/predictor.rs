use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::align::{align, FeatureVector};
use crate::error::ModelError;
use crate::linear::LinearModel;
use crate::schema::FeatureSchema;
use crate::value::Record;

/// One predicted value per target, in model order.
///
/// Serializes as `{"predicted_<target>": value, ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    values: Vec<(String, f64)>,
}

impl Prediction {
    #[must_use]
    pub fn get(&self, target: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(t, v)| (t.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Response key for a target.
    #[must_use]
    pub fn key_for(target: &str) -> String {
        format!("predicted_{target}")
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (target, value) in &self.values {
            map.serialize_entry(&Self::key_for(target), value)?;
        }
        map.end()
    }
}

/// Apply every model to the same aligned vector.
///
/// Models are independent; no output feeds another model and values are
/// returned exactly as computed.
///
/// # Errors
///
/// Propagates the first [`ModelError`] raised by a model, typically a shape
/// or schema mismatch.
pub fn predict(vector: &FeatureVector, models: &[LinearModel]) -> Result<Prediction, ModelError> {
    let values = models
        .iter()
        .map(|model| Ok((model.target().to_string(), model.predict(vector)?)))
        .collect::<Result<Vec<_>, ModelError>>()?;
    Ok(Prediction { values })
}

/// The schema and its models, loaded together and replaced together.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    schema: FeatureSchema,
    models: Vec<LinearModel>,
    loaded_at: DateTime<Utc>,
}

impl ModelBundle {
    /// # Errors
    ///
    /// Returns [`ModelError`] if there are no models, targets repeat, or a model
    /// was not trained against `schema`.
    pub fn new(schema: FeatureSchema, models: Vec<LinearModel>) -> Result<Self, ModelError> {
        if models.is_empty() {
            return Err(ModelError::Invalid(
                "a model bundle needs at least one model".to_string(),
            ));
        }

        let mut targets = HashSet::new();
        for model in &models {
            if !targets.insert(model.target()) {
                return Err(ModelError::Invalid(format!(
                    "duplicate model for target '{}'",
                    model.target()
                )));
            }
            if model.n_features() != schema.len() {
                return Err(ModelError::ShapeMismatch {
                    target: model.target().to_string(),
                    expected: schema.len(),
                    actual: model.n_features(),
                });
            }
            if model.schema_fingerprint() != schema.fingerprint() {
                return Err(ModelError::SchemaMismatch {
                    target: model.target().to_string(),
                    expected: schema.fingerprint().to_string(),
                    actual: model.schema_fingerprint().to_string(),
                });
            }
        }

        Ok(Self {
            schema,
            models,
            loaded_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn models(&self) -> &[LinearModel] {
        &self.models
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(LinearModel::target)
    }

    #[must_use]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Align `request` to this bundle's schema and predict every target.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Align`] for bad input and other variants for
    /// model failures.
    pub fn predict_record(&self, request: &Record) -> Result<Prediction, ModelError> {
        let vector = align(request, &self.schema)?;
        predict(&vector, &self.models)
    }
}
