//! Offline `predict` and `schema` commands against persisted artifacts.

use std::path::Path;

use adcast_model::{ArtifactStore, Record};
use anyhow::Context;

/// Parse `--input`: inline JSON, or `@path` to read JSON from a file.
pub(crate) fn read_input(raw: &str) -> anyhow::Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

/// Load the model bundle and print one prediction as JSON.
///
/// # Errors
///
/// Returns an error if the input is unreadable, the artifacts fail to load, or
/// the record cannot be aligned to the schema.
pub(crate) fn run_predict(input: &str, artifact_dir: &Path, pipeline: &Path) -> anyhow::Result<()> {
    let config = adcast_core::load_pipeline_config(pipeline)?;
    let payload = read_input(input)?;
    let record = Record::from_json(&payload)?;

    let bundle = ArtifactStore::new(artifact_dir).load_bundle(&config.targets)?;
    let prediction = bundle.predict_record(&record)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

/// Print the persisted schema columns in vector order.
///
/// # Errors
///
/// Returns an error if the schema file is missing or invalid.
pub(crate) fn run_schema(artifact_dir: &Path) -> anyhow::Result<()> {
    let schema = ArtifactStore::new(artifact_dir).load_schema()?;
    println!("fingerprint {}", schema.fingerprint());
    println!("{:<6}COLUMN", "INDEX");
    for (i, column) in schema.columns().iter().enumerate() {
        println!("{i:<6}{column}");
    }
    Ok(())
}
