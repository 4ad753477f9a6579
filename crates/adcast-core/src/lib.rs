//! Shared configuration for the adcast training pipeline and prediction server.

pub mod app_config;
pub mod config;
pub mod pipeline;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use pipeline::{load_pipeline_config, PipelineConfig, EVENT_TYPES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pipeline config {path}: {source}")]
    PipelineFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pipeline config: {0}")]
    PipelineFileParse(#[from] serde_yaml::Error),

    #[error("invalid pipeline config: {0}")]
    Validation(String),
}
