//! Column projection.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::error::PrepError;
use crate::table::Table;

/// Project `table` onto `column_names`, in the requested order.
///
/// Row count, row order, and cell values are unchanged. Selecting the same
/// subset twice yields the same table as selecting it once.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::UnknownColumn`] | A requested name is absent |
/// | [`PrepError::DuplicateColumn`] | A name is requested twice |
#[instrument(skip_all, fields(n_requested = column_names.len(), n_columns = table.n_columns()))]
pub fn select_subset<S: AsRef<str>>(table: &Table, column_names: &[S]) -> Result<Table, PrepError> {
    let mut seen = HashSet::with_capacity(column_names.len());
    let mut names = Vec::with_capacity(column_names.len());
    let mut columns = Vec::with_capacity(column_names.len());

    for name in column_names {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(PrepError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        let column = table.column(name)?;
        names.push(name.to_string());
        columns.push(column.clone());
    }

    debug!(selected = ?names, "subset selected");
    Ok(Table::from_parts(names, columns, table.n_rows()))
}
