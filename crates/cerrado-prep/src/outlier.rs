//! Upper-tail outlier trimming.

use tracing::{debug, info, instrument};

use crate::error::PrepError;
use crate::stats::ColumnSummary;
use crate::table::Table;

/// Default multiplier on the standard deviation.
pub const DEFAULT_N_STD: f64 = 3.0;

/// Drop rows whose value in any listed column exceeds `mean + n_std * std`.
///
/// Every threshold is computed on the input table before any row is removed,
/// so the result does not depend on the order of `numeric_columns`. A row is
/// kept only if, for every listed column, its value is present and at or
/// below that column's threshold. Columns not listed pass through unchanged
/// for the surviving rows.
///
/// An empty column list returns the table unchanged.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::InvalidStdMultiplier`] | `n_std` is not finite or not positive |
/// | [`PrepError::UnknownColumn`] | A listed column is absent |
/// | [`PrepError::NotNumeric`] | A listed column is categorical |
/// | [`PrepError::InsufficientObservations`] | A listed column has fewer than two values |
/// | [`PrepError::NonFiniteStatistic`] | A column mean or std overflowed |
pub fn remove_outliers<S: AsRef<str>>(
    table: &Table,
    numeric_columns: &[S],
    n_std: f64,
) -> Result<Table, PrepError> {
    remove_outliers_tracked(table, numeric_columns, n_std).map(|(out, _)| out)
}

/// [`remove_outliers`] plus the input positions of the kept rows.
#[instrument(skip_all, fields(n_rows = table.n_rows(), n_columns = numeric_columns.len(), n_std = n_std))]
pub(crate) fn remove_outliers_tracked<S: AsRef<str>>(
    table: &Table,
    numeric_columns: &[S],
    n_std: f64,
) -> Result<(Table, Vec<usize>), PrepError> {
    if !n_std.is_finite() || n_std <= 0.0 {
        return Err(PrepError::InvalidStdMultiplier { n_std });
    }

    let mut limits: Vec<(&[Option<f64>], f64)> = Vec::with_capacity(numeric_columns.len());
    for name in numeric_columns {
        let name = name.as_ref();
        let values = table.numeric(name)?;
        let summary = ColumnSummary::of(name, values)?;
        let threshold = summary.upper_bound(n_std);
        debug!(
            column = name,
            mean = summary.mean,
            std = summary.std,
            threshold,
            "outlier threshold"
        );
        limits.push((values, threshold));
    }

    let keep: Vec<usize> = (0..table.n_rows())
        .filter(|&row| {
            limits
                .iter()
                .all(|(values, threshold)| values[row].is_some_and(|v| v <= *threshold))
        })
        .collect();

    info!(
        rows_in = table.n_rows(),
        rows_out = keep.len(),
        "outliers removed"
    );
    Ok((table.take_rows(&keep), keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn with_spike() -> Table {
        Table::new(vec![
            (
                "N".into(),
                Column::from_values([10.0, 11.0, 9.0, 10.0, 12.0, 10.0, 11.0, 9.0, 10.0, 100.0]),
            ),
            ("Mn".into(), Column::from_values([5.0; 10])),
            (
                "Vegetation".into(),
                Column::from_labels(["a", "b", "a", "b", "a", "b", "a", "b", "a", "b"]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn extreme_row_dropped() {
        let t = remove_outliers(&with_spike(), &["N"], 2.0).unwrap();
        assert_eq!(t.n_rows(), 9);
        assert!(t.numeric("N").unwrap().iter().all(|v| v.unwrap() < 100.0));
        // categorical column carried for surviving rows
        assert_eq!(t.column("Vegetation").unwrap().len(), 9);
    }

    #[test]
    fn zero_variance_column_rejects_nothing() {
        let t = remove_outliers(&with_spike(), &["Mn"], 1.0).unwrap();
        assert_eq!(t.n_rows(), 10);
    }

    #[test]
    fn conjunctive_and_order_invariant() {
        let t = Table::new(vec![
            (
                "N".into(),
                Column::from_values([1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0]),
            ),
            (
                "P".into(),
                Column::from_values([2.0, 2.0, 9.0, 2.0, 2.0, 2.0, 2.0, 2.0]),
            ),
        ])
        .unwrap();
        let a = remove_outliers(&t, &["N", "P"], 2.0).unwrap();
        let b = remove_outliers(&t, &["P", "N"], 2.0).unwrap();
        assert_eq!(a.n_rows(), 6);
        assert_eq!(a, b);
    }

    #[test]
    fn missing_cell_in_listed_column_dropped() {
        let t = Table::new(vec![(
            "N".into(),
            Column::Numeric(vec![Some(1.0), None, Some(2.0), Some(1.5)]),
        )])
        .unwrap();
        let out = remove_outliers(&t, &["N"], DEFAULT_N_STD).unwrap();
        assert_eq!(out.numeric("N").unwrap(), &[Some(1.0), Some(2.0), Some(1.5)]);
    }

    #[test]
    fn rejects_bad_multiplier() {
        for n_std in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = remove_outliers(&with_spike(), &["N"], n_std).unwrap_err();
            assert!(matches!(err, PrepError::InvalidStdMultiplier { .. }));
        }
    }

    #[test]
    fn categorical_column_rejected() {
        let err = remove_outliers(&with_spike(), &["Vegetation"], 3.0).unwrap_err();
        assert!(matches!(err, PrepError::NotNumeric { .. }));
    }

    #[test]
    fn single_row_is_insufficient() {
        let t = with_spike().take_rows(&[0]);
        let err = remove_outliers(&t, &["N"], 3.0).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_column_list_is_identity() {
        let src = with_spike();
        let none: [&str; 0] = [];
        assert_eq!(remove_outliers(&src, &none, 3.0).unwrap(), src);
    }
}
