use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Config(#[from] adcast_core::ConfigError),

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in table '{table}': {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("table '{table}' has column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' row {row} has no value for key column '{column}'")]
    MissingKey {
        table: String,
        column: String,
        row: usize,
    },

    #[error("table '{table}' has duplicate {column} '{key}'")]
    DuplicateKey {
        table: String,
        column: String,
        key: String,
    },

    #[error("feature column '{column}' must be numeric, row {row} holds {value}")]
    NonNumericFeature {
        column: String,
        row: usize,
        value: String,
    },

    #[error("no rows available for training")]
    EmptyDataset,

    #[error("fitting model for '{target}' failed: {reason}")]
    Fit { target: String, reason: String },

    #[error(transparent)]
    Model(#[from] adcast_model::ModelError),

    #[error(transparent)]
    Artifact(#[from] adcast_model::ArtifactError),
}
