//! Offline training pipeline for adcast.
//!
//! Loads the campaign, ad and event tables, joins them into one master row per
//! ad, one-hot encodes the configured categorical columns, fits one linear
//! regression per target metric and writes the models together with the
//! shared feature schema. The run is all-or-nothing: artifacts are only
//! written once every model has been fitted.

pub mod error;
pub mod features;
pub mod master;
pub mod pipeline;
pub mod split;
pub mod table;
pub mod types;

pub use error::TrainingError;
pub use features::FeatureMatrix;
pub use master::{build_master_table, EventType, MasterTable};
pub use pipeline::{run_training, train_models, TrainedTarget};
pub use split::{train_test_indices, Split};
pub use table::Table;
pub use types::{TargetReport, TrainingReport};
