//! Fitting and the end-to-end training run.

use std::path::Path;

use adcast_core::PipelineConfig;
use adcast_model::{ArtifactStore, LinearModel};
use chrono::Utc;
use linfa_linalg::svd::SVD;
use ndarray::{Array1, Array2, Axis};

use crate::error::TrainingError;
use crate::features::FeatureMatrix;
use crate::master::build_master_table;
use crate::split::{train_test_indices, Split};
use crate::table::Table;
use crate::types::{TargetReport, TrainingReport};

/// A fitted model and how well it fits.
#[derive(Debug, Clone)]
pub struct TrainedTarget {
    pub model: LinearModel,
    pub report: TargetReport,
}

/// Fit one ordinary-least-squares model per target over the same rows.
///
/// All targets share `split`; each is fitted on the training rows and scored
/// on both partitions. Constant or collinear feature columns, and fewer rows
/// than features, yield the minimum-norm least-squares solution.
///
/// # Errors
///
/// Returns [`TrainingError::Fit`] if the decomposition fails or produces
/// non-finite parameters, and [`TrainingError::EmptyDataset`] if the split has
/// no training rows.
pub fn train_models(
    matrix: &FeatureMatrix,
    split: &Split,
) -> Result<Vec<TrainedTarget>, TrainingError> {
    if split.train.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let x_train = matrix.records().select(Axis(0), &split.train);
    let x_test = matrix.records().select(Axis(0), &split.test);
    let fingerprint = matrix.schema().fingerprint();

    let mut trained = Vec::new();
    for (target, labels) in matrix.targets() {
        let y_train = labels.select(Axis(0), &split.train);
        let y_test = labels.select(Axis(0), &split.test);

        let (intercept, params) = fit_target(target, &x_train, &y_train)?;

        let train_pred = x_train.dot(&params) + intercept;
        let (test_r2, test_mae) = if split.test.is_empty() {
            (None, None)
        } else {
            let test_pred = x_test.dot(&params) + intercept;
            (
                r_squared(&test_pred, &y_test),
                Some(mean_absolute_error(&test_pred, &y_test)),
            )
        };

        let report = TargetReport {
            target: target.to_string(),
            intercept,
            train_r2: r_squared(&train_pred, &y_train),
            train_mae: mean_absolute_error(&train_pred, &y_train),
            test_r2,
            test_mae,
        };

        tracing::info!(
            metric = target,
            intercept,
            train_r2 = ?report.train_r2,
            test_r2 = ?report.test_r2,
            test_mae = ?report.test_mae,
            "model fitted"
        );

        let model = LinearModel::new(target, fingerprint, intercept, params.to_vec())?;
        trained.push(TrainedTarget { model, report });
    }

    Ok(trained)
}

/// Least squares with intercept via SVD of the centered design matrix.
///
/// Singular values below `eps * max(rows, cols) * s_max` are treated as zero,
/// so directions the data does not determine get a zero coefficient.
fn fit_target(
    target: &str,
    records: &Array2<f64>,
    labels: &Array1<f64>,
) -> Result<(f64, Array1<f64>), TrainingError> {
    let fit_err = |reason: String| TrainingError::Fit {
        target: target.to_string(),
        reason,
    };

    let x_mean = records
        .mean_axis(Axis(0))
        .ok_or_else(|| fit_err("no training rows".to_string()))?;
    let y_mean = labels
        .mean()
        .ok_or_else(|| fit_err("no training rows".to_string()))?;
    let x = records - &x_mean;
    let y = labels - y_mean;

    let (u, sigma, vt) = if x.nrows() >= x.ncols() {
        x.svd(true, true).map_err(|e| fit_err(e.to_string()))?
    } else {
        // wide matrix: decompose the transpose and swap the factors back
        let (u, sigma, vt) = x
            .t()
            .to_owned()
            .svd(true, true)
            .map_err(|e| fit_err(e.to_string()))?;
        (
            vt.map(ndarray::ArrayBase::reversed_axes),
            sigma,
            u.map(ndarray::ArrayBase::reversed_axes),
        )
    };
    let (Some(u), Some(vt)) = (u, vt) else {
        return Err(fit_err("singular vectors were not computed".to_string()));
    };

    let s_max = sigma.iter().fold(0.0_f64, |m, &s| m.max(s));
    #[allow(clippy::cast_precision_loss)]
    let tolerance = s_max * f64::EPSILON * x.nrows().max(x.ncols()) as f64;

    let projected = u.t().dot(&y);
    let scaled: Array1<f64> = (0..vt.nrows())
        .map(|i| match (sigma.get(i), projected.get(i)) {
            (Some(&s), Some(&p)) if s > tolerance => p / s,
            _ => 0.0,
        })
        .collect();
    let params = vt.t().dot(&scaled);

    let rank = sigma.iter().filter(|&&s| s > tolerance).count();
    if rank < x.ncols() {
        tracing::warn!(
            metric = target,
            rank,
            features = x.ncols(),
            "design matrix is rank deficient; undetermined coefficients set to zero"
        );
    }

    let intercept = y_mean - x_mean.dot(&params);
    if !intercept.is_finite() || params.iter().any(|p| !p.is_finite()) {
        return Err(fit_err("solver produced non-finite parameters".to_string()));
    }
    Ok((intercept, params))
}

/// Coefficient of determination; `None` when the labels are constant.
fn r_squared(predicted: &Array1<f64>, actual: &Array1<f64>) -> Option<f64> {
    if actual.is_empty() {
        return None;
    }
    let mean = actual.mean()?;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, y)| (y - p).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

fn mean_absolute_error(predicted: &Array1<f64>, actual: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = actual.len() as f64;
    predicted
        .iter()
        .zip(actual)
        .map(|(p, y)| (y - p).abs())
        .sum::<f64>()
        / n
}

/// Run the whole pipeline: load, join, encode, fit, then persist.
///
/// Artifacts are written only after every model has been fitted, so a failed
/// run leaves any previous artifacts untouched.
///
/// # Errors
///
/// Returns the first [`TrainingError`] from any stage.
pub fn run_training(
    data_dir: &Path,
    artifact_dir: &Path,
    config: &PipelineConfig,
) -> Result<TrainingReport, TrainingError> {
    config.validate()?;

    let campaigns = Table::load("campaigns", &data_dir.join(&config.campaigns_file))?;
    let ads = Table::load("ads", &data_dir.join(&config.ads_file))?;
    let events = Table::load("events", &data_dir.join(&config.events_file))?;

    let master = build_master_table(&campaigns, &ads, &events)?;
    let matrix = FeatureMatrix::build(&master, config)?;
    let split = train_test_indices(matrix.n_rows(), config.test_fraction, config.split_seed);
    tracing::info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = config.split_seed,
        "rows partitioned"
    );

    let trained = train_models(&matrix, &split)?;

    let report = TrainingReport {
        trained_at: Utc::now(),
        ads: master.len(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        features: matrix.schema().len(),
        schema_fingerprint: matrix.schema().fingerprint().to_string(),
        split_seed: config.split_seed,
        targets: trained.iter().map(|t| t.report.clone()).collect(),
    };

    let store = ArtifactStore::new(artifact_dir);
    for target in &trained {
        let path = store.write_model(&target.model)?;
        tracing::info!(metric = target.model.target(), path = %path.display(), "model saved");
    }
    store.write_report(&report)?;
    let path = store.write_schema(matrix.schema())?;
    tracing::info!(
        path = %path.display(),
        columns = matrix.schema().len(),
        "feature schema saved"
    );

    Ok(report)
}
