use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Event types recorded in the events table, in outcome-column order.
pub const EVENT_TYPES: [&str; 6] = ["click", "comment", "impression", "like", "purchase", "share"];

/// Column layout and training knobs shared by the training run and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub campaigns_file: String,
    pub ads_file: String,
    pub events_file: String,
    /// Columns expanded into indicator columns, in output order.
    pub categorical_columns: Vec<String>,
    /// Identifier and date columns never used as features.
    pub excluded_columns: Vec<String>,
    /// Outcome columns to fit one model each for.
    pub targets: Vec<String>,
    pub test_fraction: f64,
    pub split_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            campaigns_file: "campaigns.csv".to_string(),
            ads_file: "ads.csv".to_string(),
            events_file: "ad_events.csv".to_string(),
            categorical_columns: [
                "ad_platform",
                "ad_type",
                "target_gender",
                "target_age_group",
                "target_interests",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_columns: ["ad_id", "campaign_id", "name", "start_date", "end_date"]
                .into_iter()
                .map(String::from)
                .collect(),
            targets: ["purchase", "click", "share"]
                .into_iter()
                .map(String::from)
                .collect(),
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Validation(
                "at least one target must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !EVENT_TYPES.contains(&target.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "target '{target}' is not an event type; expected one of {}",
                    EVENT_TYPES.join(", ")
                )));
            }
            if !seen.insert(target.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate target: '{target}'"
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in &self.categorical_columns {
            if column.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "categorical column names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate categorical column: '{column}'"
                )));
            }
            if self.excluded_columns.contains(column) {
                return Err(ConfigError::Validation(format!(
                    "column '{column}' is both categorical and excluded"
                )));
            }
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Validation(format!(
                "test_fraction must be within (0, 1), got {}",
                self.test_fraction
            )));
        }

        Ok(())
    }
}

/// Load the pipeline configuration from a YAML file.
///
/// A missing file yields [`PipelineConfig::default`]; keys absent from the
/// file keep their default values.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or fails validation.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => serde_yaml::from_str::<PipelineConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PipelineConfig::default(),
        Err(e) => {
            return Err(ConfigError::PipelineFileIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.targets, vec!["purchase", "click", "share"]);
        assert_eq!(config.split_seed, 42);
    }

    #[test]
    fn validate_rejects_unknown_target() {
        let config = PipelineConfig {
            targets: vec!["conversion".to_string()],
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'conversion' is not an event type"));
    }

    #[test]
    fn validate_rejects_duplicate_target() {
        let config = PipelineConfig {
            targets: vec!["click".to_string(), "click".to_string()],
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate target"));
    }

    #[test]
    fn validate_rejects_empty_targets() {
        let config = PipelineConfig {
            targets: vec![],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_fraction() {
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            let config = PipelineConfig {
                test_fraction: fraction,
                ..PipelineConfig::default()
            };
            assert!(config.validate().is_err(), "fraction {fraction} accepted");
        }
    }

    #[test]
    fn validate_rejects_categorical_that_is_excluded() {
        let config = PipelineConfig {
            categorical_columns: vec!["name".to_string()],
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both categorical and excluded"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_pipeline_config(&dir.path().join("absent.yaml")).expect("defaults");
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "targets: [purchase]\nsplit_seed: 7").expect("write");
        let config = load_pipeline_config(file.path()).expect("load");
        assert_eq!(config.targets, vec!["purchase"]);
        assert_eq!(config.split_seed, 7);
        assert_eq!(config.ads_file, "ads.csv");
        assert_eq!(config.categorical_columns.len(), 5);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/pipeline.yaml");
        let config = load_pipeline_config(&path).expect("shipped config loads");
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "targets: {{ not: a list").expect("write");
        let err = load_pipeline_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::PipelineFileParse(_)));
    }
}
