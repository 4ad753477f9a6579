use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fit quality for one target metric.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: String,
    pub intercept: f64,
    /// R² over the training rows. `None` when undefined (constant labels).
    pub train_r2: Option<f64>,
    pub train_mae: f64,
    /// `None` when the test partition is empty or R² is undefined.
    pub test_r2: Option<f64>,
    pub test_mae: Option<f64>,
}

/// Summary of one training run, persisted next to the artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub ads: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: usize,
    pub schema_fingerprint: String,
    pub split_seed: u64,
    pub targets: Vec<TargetReport>,
}
