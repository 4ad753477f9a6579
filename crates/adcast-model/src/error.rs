use std::path::PathBuf;

use thiserror::Error;

/// Failures turning a request into an aligned feature vector.
///
/// These are client-input problems.
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("field '{field}' must be numeric, got {value}")]
    Coercion { field: String, value: String },

    #[error("field '{field}' has unsupported value type: {kind}")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Failures applying models to a feature vector or assembling a bundle.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("model '{target}' expects {expected} features, vector has {actual}")]
    ShapeMismatch {
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("model '{target}' was trained on schema {expected}, vector uses {actual}")]
    SchemaMismatch {
        target: String,
        expected: String,
        actual: String,
    },

    #[error("invalid model: {0}")]
    Invalid(String),
}

impl ModelError {
    /// Whether the error was caused by the request rather than the loaded models.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, ModelError::Align(_))
    }
}

/// Failures reading or writing persisted schema/model files.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {path} has unsupported format version {found}")]
    UnsupportedFormat { path: PathBuf, found: u32 },

    #[error("artifact {path} fingerprint mismatch: expected {expected}, found {found}")]
    FingerprintMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("artifact {path} has {found} coefficients, schema has {expected} columns")]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
