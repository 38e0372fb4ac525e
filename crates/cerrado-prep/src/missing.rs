//! Removal of rows or columns holding missing cells.

use tracing::{info, instrument};

use crate::error::PrepError;
use crate::table::Table;

/// Which dimension [`drop_missing`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    /// Drop rows.
    #[default]
    Rows,
    /// Drop columns.
    Columns,
}

/// When a row or column counts as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum How {
    /// Drop if any cell is missing.
    #[default]
    Any,
    /// Drop only if every cell is missing.
    All,
}

impl How {
    fn should_drop(self, n_missing: usize, n_cells: usize) -> bool {
        match self {
            How::Any => n_missing > 0,
            How::All => n_missing == n_cells,
        }
    }
}

/// Remove rows or columns containing missing cells.
///
/// Under [`How::All`] a row (or column) with at least one present cell is
/// always kept. Dropping every column leaves an empty table with zero rows.
///
/// Returns `Result` to keep the same shape as the other cleaning steps; the
/// operation itself has no failure mode.
///
/// # Errors
///
/// None at present.
pub fn drop_missing(table: &Table, axis: Axis, how: How) -> Result<Table, PrepError> {
    Ok(drop_missing_tracked(table, axis, how).0)
}

/// [`drop_missing`] plus the input positions of the kept rows.
///
/// The positions are `None` when every row survives in place.
#[instrument(skip(table), fields(n_rows = table.n_rows(), n_columns = table.n_columns()))]
pub(crate) fn drop_missing_tracked(table: &Table, axis: Axis, how: How) -> (Table, Option<Vec<usize>>) {
    let (out, kept) = match axis {
        Axis::Rows => {
            let n_cells = table.n_columns();
            let keep: Vec<usize> = (0..table.n_rows())
                .filter(|&row| {
                    let n_missing = table
                        .columns()
                        .iter()
                        .filter(|c| c.is_missing(row))
                        .count();
                    !how.should_drop(n_missing, n_cells)
                })
                .collect();
            (table.take_rows(&keep), Some(keep))
        }
        Axis::Columns => {
            let n_cells = table.n_rows();
            let (names, columns): (Vec<String>, Vec<_>) = table
                .iter()
                .filter(|(_, c)| !how.should_drop(c.n_missing(), n_cells))
                .map(|(n, c)| (n.to_string(), c.clone()))
                .unzip();
            // no columns left means no rows left
            let kept = columns.is_empty().then(Vec::new);
            let n_rows = if columns.is_empty() { 0 } else { table.n_rows() };
            (Table::from_parts(names, columns, n_rows), kept)
        }
    };

    info!(
        rows_dropped = table.n_rows() - out.n_rows(),
        columns_dropped = table.n_columns() - out.n_columns(),
        "missing values removed"
    );
    (out, kept)
}
