//! The in-memory table threaded through every pipeline stage.

use std::collections::HashSet;
use std::fmt;

use crate::column::{Column, ColumnKind};
use crate::error::PrepError;

/// An ordered set of named, equal-length columns.
///
/// Row order is meaningful and is never changed implicitly. Tables are
/// treated as values: every cleaning operation borrows its input and
/// returns a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table from `(name, column)` pairs.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::DuplicateColumn`] | Two columns share a name |
    /// | [`PrepError::LengthMismatch`] | Columns differ in length |
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self, PrepError> {
        let n_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut seen = HashSet::with_capacity(columns.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if !seen.insert(name.clone()) {
                return Err(PrepError::DuplicateColumn { name });
            }
            if column.len() != n_rows {
                return Err(PrepError::LengthMismatch {
                    name,
                    expected: n_rows,
                    got: column.len(),
                });
            }
            names.push(name);
            cols.push(column);
        }

        Ok(Self {
            names,
            columns: cols,
            n_rows,
        })
    }

    /// Build a table whose columns are already known to be valid.
    pub(crate) fn from_parts(names: Vec<String>, columns: Vec<Column>, n_rows: usize) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self {
            names,
            columns,
            n_rows,
        }
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Return the column names in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Return the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Iterate over `(name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Return the position of a column by name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Look up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownColumn`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<&Column, PrepError> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| self.unknown(name))
    }

    /// Look up a numeric column by name.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::UnknownColumn`] | No column has that name |
    /// | [`PrepError::NotNumeric`] | The column is categorical |
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], PrepError> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| PrepError::NotNumeric {
                name: name.to_string(),
            })
    }

    /// Return the kind of a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::UnknownColumn`] if no column has that name.
    pub fn kind(&self, name: &str) -> Result<ColumnKind, PrepError> {
        Ok(self.column(name)?.kind())
    }

    /// Return true if any cell in `row` is missing.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.is_missing(row))
    }

    /// Build a new table containing only `rows`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any row index is out of bounds.
    #[must_use]
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        let columns = self.columns.iter().map(|c| c.take(rows)).collect();
        Table::from_parts(self.names.clone(), columns, rows.len())
    }

    /// Build the error for a missing column name.
    pub(crate) fn unknown(&self, name: &str) -> PrepError {
        PrepError::UnknownColumn {
            name: name.to_string(),
            available: self.names.clone(),
        }
    }
}

impl fmt::Display for Table {
    /// Render a short preview: header plus up to the first ten rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.names.join("\t"))?;
        for row in 0..self.n_rows.min(10) {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| match c {
                    Column::Numeric(v) => v[row].map_or_else(|| "NA".to_string(), |x| format!("{x}")),
                    Column::Categorical(v) => v[row].clone().unwrap_or_else(|| "NA".to_string()),
                })
                .collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        if self.n_rows > 10 {
            writeln!(f, "... ({} rows)", self.n_rows)?;
        }
        Ok(())
    }
}
