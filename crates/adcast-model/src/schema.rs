use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ModelError;

pub const SCHEMA_FORMAT_VERSION: u32 = 1;

/// The ordered feature columns every trained model expects.
///
/// Cheap to clone; all clones share one allocation. Equality compares the
/// ordered column list only.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    inner: Arc<SchemaInner>,
}

#[derive(Debug)]
struct SchemaInner {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    fingerprint: String,
}

impl FeatureSchema {
    /// Build a schema from its ordered columns.
    ///
    /// `numeric_columns` are the source fields copied through as numbers (and
    /// coerced at inference); `categorical_columns` are the source fields that
    /// were expanded into indicator columns.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Invalid`] if `columns` is empty or has duplicates.
    pub fn new(
        columns: Vec<String>,
        numeric_columns: Vec<String>,
        categorical_columns: Vec<String>,
    ) -> Result<Self, ModelError> {
        if columns.is_empty() {
            return Err(ModelError::Invalid(
                "feature schema must have at least one column".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if positions.insert(column.clone(), i).is_some() {
                return Err(ModelError::Invalid(format!(
                    "duplicate feature column '{column}'"
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in numeric_columns.iter().chain(&categorical_columns) {
            if !seen.insert(column.as_str()) {
                return Err(ModelError::Invalid(format!(
                    "source column '{column}' declared twice"
                )));
            }
        }

        let fingerprint = fingerprint_columns(&columns);

        Ok(Self {
            inner: Arc::new(SchemaInner {
                columns,
                positions,
                numeric_columns,
                categorical_columns,
                fingerprint,
            }),
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.inner.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.columns.len()
    }

    /// Always false; construction rejects empty schemas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.columns.is_empty()
    }

    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.inner.positions.get(column).copied()
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.inner.positions.contains_key(column)
    }

    #[must_use]
    pub fn numeric_columns(&self) -> &[String] {
        &self.inner.numeric_columns
    }

    #[must_use]
    pub fn categorical_columns(&self) -> &[String] {
        &self.inner.categorical_columns
    }

    /// SHA-256 over the ordered column list.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    #[must_use]
    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            format_version: SCHEMA_FORMAT_VERSION,
            fingerprint: self.inner.fingerprint.clone(),
            columns: self.inner.columns.clone(),
            numeric_columns: self.inner.numeric_columns.clone(),
            categorical_columns: self.inner.categorical_columns.clone(),
        }
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.columns == other.inner.columns
    }
}

impl Eq for FeatureSchema {}

/// On-disk form of a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub format_version: u32,
    pub fingerprint: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
}

pub(crate) fn fingerprint_columns(columns: &[String]) -> String {
    let mut hasher = Sha256::new();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(column.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
