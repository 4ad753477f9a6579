use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use adcast_model::Value;

use crate::error::TrainingError;

/// A loaded source table: ordered column names and typed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// # Errors
    ///
    /// Returns [`TrainingError::DuplicateColumn`] if a column name repeats.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TrainingError> {
        let name = name.into();

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TrainingError::DuplicateColumn {
                    table: name,
                    column: column.clone(),
                });
            }
        }

        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));

        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    /// Read a headed CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Io`] if the file cannot be opened and
    /// [`TrainingError::Csv`] if it is not well-formed.
    pub fn load(name: &str, path: &Path) -> Result<Self, TrainingError> {
        let file = File::open(path).map_err(|source| TrainingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(name, file)?;
        tracing::info!(
            table = name,
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "table loaded"
        );
        Ok(table)
    }

    /// Read headed CSV from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Csv`] on malformed input.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, TrainingError> {
        let csv_err = |source| TrainingError::Csv {
            table: name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(ToOwned::to_owned)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(Value::parse_cell).collect());
        }

        Self::new(name, columns, rows)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Index of `column`, or a schema error naming this table.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::MissingColumn`] if the column is absent.
    pub fn require_column(&self, column: &str) -> Result<usize, TrainingError> {
        self.column_index(column)
            .ok_or_else(|| TrainingError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }
}
