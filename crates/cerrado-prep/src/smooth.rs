//! Exponentially weighted moving average smoothing.

use tracing::{info, instrument};

use crate::column::Column;
use crate::error::PrepError;
use crate::table::Table;

/// Default smoothing factor.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Replace each listed column with its EWMA in current row order.
///
/// With `adjust = true` each output is the weighted mean of all values so far
/// with weights `(1 - alpha)^k`. With `adjust = false` the recursive form
/// `y[i] = alpha * x[i] + (1 - alpha) * y[i - 1]` is used.
///
/// A missing cell contributes no value but still ages the weights of earlier
/// observations. Its output is the running average, or missing if no value
/// has been seen yet.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::InvalidAlpha`] | `alpha` is outside (0, 1] |
/// | [`PrepError::UnknownColumn`] | A listed column is absent |
/// | [`PrepError::NotNumeric`] | A listed column is categorical |
#[instrument(skip_all, fields(n_rows = table.n_rows(), n_columns = numeric_columns.len(), alpha = alpha, adjust = adjust))]
pub fn smooth<S: AsRef<str>>(
    table: &Table,
    numeric_columns: &[S],
    alpha: f64,
    adjust: bool,
) -> Result<Table, PrepError> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(PrepError::InvalidAlpha { alpha });
    }

    let mut columns = table.columns().to_vec();
    for name in numeric_columns {
        let name = name.as_ref();
        let idx = table.position(name).ok_or_else(|| table.unknown(name))?;
        let values = table.columns()[idx]
            .as_numeric()
            .ok_or_else(|| PrepError::NotNumeric {
                name: name.to_string(),
            })?;
        columns[idx] = Column::Numeric(ewma(values, alpha, adjust));
    }

    info!(n_rows = table.n_rows(), "columns smoothed");
    Ok(Table::from_parts(
        table.column_names().to_vec(),
        columns,
        table.n_rows(),
    ))
}

/// EWMA of a single series.
pub(crate) fn ewma(values: &[Option<f64>], alpha: f64, adjust: bool) -> Vec<Option<f64>> {
    let decay = 1.0 - alpha;
    let new_wt = if adjust { 1.0 } else { alpha };
    let mut old_wt = 1.0;
    let mut weighted: Option<f64> = None;
    let mut out = Vec::with_capacity(values.len());

    for &cur in values {
        match weighted {
            None => weighted = cur,
            Some(w) => {
                old_wt *= decay;
                if let Some(x) = cur {
                    if w != x {
                        weighted = Some((old_wt * w + new_wt * x) / (old_wt + new_wt));
                    }
                    if adjust {
                        old_wt += new_wt;
                    } else {
                        old_wt = 1.0;
                    }
                }
            }
        }
        out.push(weighted);
    }
    out
}
