//! The `train` command.

use std::path::Path;

use adcast_training::TrainingReport;

/// Run the pipeline end to end and print a per-target summary.
///
/// # Errors
///
/// Returns an error if the pipeline config is invalid or any training stage
/// fails. Previously written artifacts are left untouched in that case.
pub(crate) fn run_train(data_dir: &Path, artifact_dir: &Path, pipeline: &Path) -> anyhow::Result<()> {
    let config = adcast_core::load_pipeline_config(pipeline)?;
    tracing::info!(
        data_dir = %data_dir.display(),
        artifact_dir = %artifact_dir.display(),
        targets = ?config.targets,
        "starting training run"
    );

    let report = adcast_training::run_training(data_dir, artifact_dir, &config)?;
    print!("{}", format_report(&report));
    println!("artifacts written to {}", artifact_dir.display());
    Ok(())
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

pub(crate) fn format_report(report: &TrainingReport) -> String {
    let mut out = format!(
        "trained on {} ads ({} train / {} test), {} features\n",
        report.ads, report.train_rows, report.test_rows, report.features
    );
    out.push_str(&format!(
        "{:<12}{:<14}{:<12}{:<12}TEST MAE\n",
        "TARGET", "INTERCEPT", "TRAIN R2", "TEST R2"
    ));
    for target in &report.targets {
        out.push_str(&format!(
            "{:<12}{:<14.4}{:<12}{:<12}{}\n",
            target.target,
            target.intercept,
            fmt_metric(target.train_r2),
            fmt_metric(target.test_r2),
            fmt_metric(target.test_mae),
        ));
    }
    out
}
