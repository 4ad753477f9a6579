use std::collections::BTreeSet;

use adcast_core::{PipelineConfig, EVENT_TYPES};
use adcast_model::{indicator_column, FeatureSchema, Value};
use ndarray::{Array1, Array2};

use crate::error::TrainingError;
use crate::master::MasterTable;

/// Design matrix and label columns derived from the master table.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    records: Array2<f64>,
    targets: Vec<(String, Array1<f64>)>,
}

/// One output column and how to compute it from a master row.
enum FeatureSource {
    Numeric(usize),
    Indicator { column: usize, label: String },
}

impl FeatureMatrix {
    /// Engineer features from `master`.
    ///
    /// Numeric passthrough columns come first, in master-table order, followed
    /// by the indicator columns of each categorical column in configured order.
    /// Each categorical column's labels are sorted and the first is dropped as
    /// the reference category. Missing numeric cells become `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::MissingColumn`] if a configured categorical or
    /// target column is absent, [`TrainingError::NonNumericFeature`] if a
    /// passthrough column holds text, and [`TrainingError::EmptyDataset`] if
    /// the table has no rows.
    pub fn build(master: &MasterTable, config: &PipelineConfig) -> Result<Self, TrainingError> {
        if master.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let categorical: Vec<usize> = config
            .categorical_columns
            .iter()
            .map(|c| master.require_column(c))
            .collect::<Result<_, _>>()?;
        let target_columns: Vec<usize> = config
            .targets
            .iter()
            .map(|t| master.require_column(t))
            .collect::<Result<_, _>>()?;

        let mut names = Vec::new();
        let mut sources = Vec::new();
        let mut numeric_columns = Vec::new();

        for (i, column) in master.columns().iter().enumerate() {
            let skip = categorical.contains(&i)
                || config.excluded_columns.contains(column)
                || EVENT_TYPES.contains(&column.as_str());
            if skip {
                continue;
            }
            names.push(column.clone());
            numeric_columns.push(column.clone());
            sources.push(FeatureSource::Numeric(i));
        }

        for (&i, column) in categorical.iter().zip(&config.categorical_columns) {
            let labels: BTreeSet<String> = master
                .column_values(i)
                .filter_map(Value::category_label)
                .collect();
            for label in labels.into_iter().skip(1) {
                names.push(indicator_column(column, &label));
                sources.push(FeatureSource::Indicator { column: i, label });
            }
        }

        let schema = FeatureSchema::new(
            names,
            numeric_columns,
            config.categorical_columns.clone(),
        )?;

        let mut records = Array2::<f64>::zeros((master.len(), schema.len()));
        for (r, row) in master.rows().iter().enumerate() {
            for (c, source) in sources.iter().enumerate() {
                records[[r, c]] = match source {
                    FeatureSource::Numeric(i) => numeric_cell(&row[*i], &master.columns()[*i], r)?,
                    FeatureSource::Indicator { column, label } => {
                        if row[*column].category_label().as_deref() == Some(label.as_str()) {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
            }
        }

        let targets = config
            .targets
            .iter()
            .zip(target_columns)
            .map(|(name, i)| {
                let values = master
                    .rows()
                    .iter()
                    .enumerate()
                    .map(|(r, row)| numeric_cell(&row[i], name, r))
                    .collect::<Result<Array1<f64>, _>>()?;
                Ok((name.clone(), values))
            })
            .collect::<Result<Vec<_>, TrainingError>>()?;

        tracing::info!(
            rows = records.nrows(),
            features = schema.len(),
            targets = targets.len(),
            "feature matrix built"
        );

        Ok(Self {
            schema,
            records,
            targets,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn records(&self) -> &Array2<f64> {
        &self.records
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.records.nrows()
    }

    #[must_use]
    pub fn target(&self, name: &str) -> Option<&Array1<f64>> {
        self.targets
            .iter()
            .find(|(t, _)| t == name)
            .map(|(_, values)| values)
    }

    pub fn targets(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.targets.iter().map(|(t, v)| (t.as_str(), v))
    }
}

fn numeric_cell(value: &Value, column: &str, row: usize) -> Result<f64, TrainingError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Missing => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Text(_) => Err(TrainingError::NonNumericFeature {
            column: column.to_string(),
            row,
            value: value.to_string(),
        }),
    }
}
