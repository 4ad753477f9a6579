//! Persistence of the feature schema, fitted models and training report.
//!
//! Layout under the artifact directory:
//!
//! - `feature_schema.json`: the ordered feature columns, written once per run
//! - `<target>_model.json`: one per target metric
//! - `training_report.json`: fit metrics from the run that produced them

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ArtifactError;
use crate::linear::{LinearModel, ModelDocument, MODEL_FORMAT_VERSION};
use crate::predictor::ModelBundle;
use crate::schema::{fingerprint_columns, FeatureSchema, SchemaDocument, SCHEMA_FORMAT_VERSION};

const SCHEMA_FILE: &str = "feature_schema.json";
const REPORT_FILE: &str = "training_report.json";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(SCHEMA_FILE)
    }

    #[must_use]
    pub fn model_path(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{target}_model.json"))
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if the file cannot be written.
    pub fn write_schema(&self, schema: &FeatureSchema) -> Result<PathBuf, ArtifactError> {
        let path = self.schema_path();
        write_json(&path, &schema.to_document())?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if the file cannot be written.
    pub fn write_model(&self, model: &LinearModel) -> Result<PathBuf, ArtifactError> {
        let path = self.model_path(model.target());
        write_json(&path, &model.to_document())?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] if the file cannot be written.
    pub fn write_report<T: Serialize>(&self, report: &T) -> Result<PathBuf, ArtifactError> {
        let path = self.report_path();
        write_json(&path, report)?;
        Ok(path)
    }

    /// Read and verify the persisted feature schema.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the file is missing, malformed, from an
    /// unknown format version, or its fingerprint does not match its columns.
    pub fn load_schema(&self) -> Result<FeatureSchema, ArtifactError> {
        let path = self.schema_path();
        let doc: SchemaDocument = read_json(&path)?;

        if doc.format_version != SCHEMA_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedFormat {
                path,
                found: doc.format_version,
            });
        }

        let computed = fingerprint_columns(&doc.columns);
        if computed != doc.fingerprint {
            return Err(ArtifactError::FingerprintMismatch {
                path,
                expected: computed,
                found: doc.fingerprint,
            });
        }

        FeatureSchema::new(doc.columns, doc.numeric_columns, doc.categorical_columns).map_err(
            |e| ArtifactError::Invalid {
                path,
                reason: e.to_string(),
            },
        )
    }

    /// Read the model for `target` and check it against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] if the file is missing or malformed, belongs
    /// to another target, or was fitted against a different schema.
    pub fn load_model(
        &self,
        target: &str,
        schema: &FeatureSchema,
    ) -> Result<LinearModel, ArtifactError> {
        let path = self.model_path(target);
        let doc: ModelDocument = read_json(&path)?;

        if doc.format_version != MODEL_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedFormat {
                path,
                found: doc.format_version,
            });
        }
        if doc.target != target {
            return Err(ArtifactError::Invalid {
                path,
                reason: format!("expected target '{target}', file holds '{}'", doc.target),
            });
        }
        if doc.schema_fingerprint != schema.fingerprint() {
            return Err(ArtifactError::FingerprintMismatch {
                path,
                expected: schema.fingerprint().to_string(),
                found: doc.schema_fingerprint,
            });
        }
        if doc.coefficients.len() != schema.len() {
            return Err(ArtifactError::ShapeMismatch {
                path,
                expected: schema.len(),
                found: doc.coefficients.len(),
            });
        }

        LinearModel::new(
            doc.target,
            doc.schema_fingerprint,
            doc.intercept,
            doc.coefficients,
        )
        .map_err(|e| ArtifactError::Invalid {
            path,
            reason: e.to_string(),
        })
    }

    /// Load the schema and one model per target as a single bundle.
    ///
    /// # Errors
    ///
    /// Returns the first [`ArtifactError`] encountered; no partial bundle is
    /// ever produced.
    pub fn load_bundle(&self, targets: &[String]) -> Result<ModelBundle, ArtifactError> {
        let schema = self.load_schema()?;
        let models = targets
            .iter()
            .map(|target| self.load_model(target, &schema))
            .collect::<Result<Vec<_>, _>>()?;

        let bundle = ModelBundle::new(schema, models).map_err(|e| ArtifactError::Invalid {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            dir = %self.dir.display(),
            features = bundle.schema().len(),
            models = bundle.models().len(),
            "model bundle loaded"
        );
        Ok(bundle)
    }
}

/// Serialize to a temporary sibling, then rename over `path`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(value).map_err(|e| ArtifactError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
