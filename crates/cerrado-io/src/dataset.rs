//! Extraction of a labelled feature matrix from a prepared table.

use cerrado_prep::{Column, Table};
use cerrado_rf::{RfError, SplitDataset, train_test_split};
use tracing::{debug, instrument};

use crate::IoError;

/// Feature rows with class-index labels, ready for training.
///
/// `features[i]` and `labels[i]` describe table row `i`. `labels[i]` indexes
/// into `class_names`, which holds the distinct labels in sorted order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledData {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    feature_names: Vec<String>,
    class_names: Vec<String>,
}

impl LabeledData {
    /// Build from `feature_columns` (numeric, fully present) and `label_column`.
    ///
    /// Categorical labels sort as text; numeric labels sort by value and are
    /// rendered as text.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownColumn`] | a named column is not in the table |
    /// | [`IoError::NotNumeric`] | a feature column is categorical |
    /// | [`IoError::MissingValue`] | a feature or label cell is missing |
    #[instrument(skip_all, fields(n_rows = table.n_rows(), label = label_column))]
    pub fn from_table<S: AsRef<str>>(
        table: &Table,
        feature_columns: &[S],
        label_column: &str,
    ) -> Result<Self, IoError> {
        let features = feature_matrix(table, feature_columns)?;
        let (labels, class_names) = encode_labels(lookup(table, label_column)?, label_column)?;
        debug!(n_classes = class_names.len(), classes = ?class_names, "labels encoded");

        Ok(Self {
            features,
            labels,
            feature_names: feature_columns.iter().map(|s| s.as_ref().to_string()).collect(),
            class_names,
        })
    }

    /// Stratified train/test split of the rows.
    ///
    /// # Errors
    ///
    /// See [`cerrado_rf::train_test_split`].
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<SplitDataset, RfError> {
        train_test_split(&self.features, &self.labels, test_fraction, seed)
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the class index of each row.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the sorted distinct class names.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }
}

/// Row-major matrix of `columns`, each numeric with no missing cell.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::UnknownColumn`] | a named column is not in the table |
/// | [`IoError::NotNumeric`] | a column is categorical |
/// | [`IoError::MissingValue`] | a cell is missing |
pub fn feature_matrix<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Vec<Vec<f64>>, IoError> {
    let mut matrix = vec![Vec::with_capacity(columns.len()); table.n_rows()];
    for name in columns {
        let name = name.as_ref();
        let values = lookup(table, name)?
            .as_numeric()
            .ok_or_else(|| IoError::NotNumeric {
                name: name.to_string(),
            })?;
        for (row_index, (row, value)) in matrix.iter_mut().zip(values).enumerate() {
            let value = value.ok_or_else(|| IoError::MissingValue {
                column: name.to_string(),
                row_index,
            })?;
            row.push(value);
        }
    }
    Ok(matrix)
}

fn lookup<'t>(table: &'t Table, name: &str) -> Result<&'t Column, IoError> {
    table.column(name).map_err(|_| IoError::UnknownColumn {
        name: name.to_string(),
        available: table.column_names().to_vec(),
    })
}

fn encode_labels(column: &Column, name: &str) -> Result<(Vec<usize>, Vec<String>), IoError> {
    let missing = |row_index| IoError::MissingValue {
        column: name.to_string(),
        row_index,
    };

    let text: Vec<String> = match column {
        Column::Categorical(cells) => cells
            .iter()
            .enumerate()
            .map(|(i, c)| c.clone().ok_or_else(|| missing(i)))
            .collect::<Result<_, _>>()?,
        Column::Numeric(cells) => {
            let values: Vec<f64> = cells
                .iter()
                .enumerate()
                .map(|(i, c)| c.ok_or_else(|| missing(i)))
                .collect::<Result<_, _>>()?;
            let mut distinct = values.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            let class_names: Vec<String> = distinct.iter().map(f64::to_string).collect();
            let labels = values
                .iter()
                .map(|v| distinct.partition_point(|d| d.total_cmp(v).is_lt()))
                .collect();
            return Ok((labels, class_names));
        }
    };

    let mut class_names = text.clone();
    class_names.sort();
    class_names.dedup();
    let labels = text
        .iter()
        .map(|t| class_names.partition_point(|c| c < t))
        .collect();
    Ok((labels, class_names))
}
