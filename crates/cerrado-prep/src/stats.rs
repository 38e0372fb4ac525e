//! Column summary statistics over observed (non-missing) cells.

use crate::error::PrepError;

/// Mean and sample standard deviation of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    /// Arithmetic mean of the observed values.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    /// Number of observed values.
    pub observed: usize,
}

impl ColumnSummary {
    /// Summarise a numeric column, skipping missing cells.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::InsufficientObservations`] | Fewer than two observed values |
    /// | [`PrepError::NonFiniteStatistic`] | Mean or std overflowed |
    pub fn of(column: &str, values: &[Option<f64>]) -> Result<Self, PrepError> {
        let observed: Vec<f64> = values.iter().flatten().copied().collect();
        let n = observed.len();
        if n < 2 {
            return Err(PrepError::InsufficientObservations {
                column: column.to_string(),
                observed: n,
            });
        }

        let mean = observed.iter().sum::<f64>() / n as f64;
        if !mean.is_finite() {
            return Err(PrepError::NonFiniteStatistic {
                column: column.to_string(),
                statistic: "mean",
            });
        }

        let variance = observed.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std = variance.sqrt();
        if !std.is_finite() {
            return Err(PrepError::NonFiniteStatistic {
                column: column.to_string(),
                statistic: "std",
            });
        }

        Ok(Self {
            mean,
            std,
            observed: n,
        })
    }

    /// Upper acceptance bound `mean + n_std * std`.
    #[must_use]
    pub fn upper_bound(&self, n_std: f64) -> f64 {
        self.mean + n_std * self.std
    }
}
