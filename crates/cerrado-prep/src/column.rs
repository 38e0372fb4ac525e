//! Column storage: numeric or categorical cells, each possibly missing.

/// The kind of values a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Floating-point measurements.
    Numeric,
    /// Free text labels.
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => f.write_str("numeric"),
            ColumnKind::Categorical => f.write_str("categorical"),
        }
    }
}

/// A single table column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric cells.
    Numeric(Vec<Option<f64>>),
    /// Categorical cells.
    Categorical(Vec<Option<String>>),
}

impl Column {
    /// Build a numeric column with no missing cells.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Column::Numeric(values.into_iter().map(Some).collect())
    }

    /// Build a categorical column with no missing cells.
    #[must_use]
    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Column::Categorical(labels.into_iter().map(|s| Some(s.into())).collect())
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// Return true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the column kind.
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Categorical(_) => ColumnKind::Categorical,
        }
    }

    /// Return true if the cell at `row` is missing.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v[row].is_none(),
            Column::Categorical(v) => v[row].is_none(),
        }
    }

    /// Count the missing cells.
    #[must_use]
    pub fn n_missing(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Borrow the numeric cells, or `None` for a categorical column.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Categorical(_) => None,
        }
    }

    /// Borrow the categorical cells, or `None` for a numeric column.
    #[must_use]
    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Numeric(_) => None,
            Column::Categorical(v) => Some(v),
        }
    }

    /// Build a new column holding the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_len() {
        let c = Column::from_values([1.0, 2.0, 3.0]);
        assert_eq!(c.kind(), ColumnKind::Numeric);
        assert_eq!(c.len(), 3);
        let c = Column::from_labels(["Cerradão", "Campo"]);
        assert_eq!(c.kind(), ColumnKind::Categorical);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn missing_cells_counted() {
        let c = Column::Numeric(vec![Some(1.0), None, None, Some(4.0)]);
        assert!(c.is_missing(1));
        assert!(!c.is_missing(0));
        assert_eq!(c.n_missing(), 2);
    }

    #[test]
    fn take_reorders_and_repeats() {
        let c = Column::from_labels(["a", "b", "c"]);
        let taken = c.take(&[2, 0, 0]);
        assert_eq!(
            taken.as_categorical().unwrap(),
            &[Some("c".to_string()), Some("a".to_string()), Some("a".to_string())]
        );
    }

    #[test]
    fn accessors_match_kind() {
        let c = Column::from_values([1.0]);
        assert!(c.as_numeric().is_some());
        assert!(c.as_categorical().is_none());
    }
}
