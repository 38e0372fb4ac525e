//! Error types for table construction and cleaning operations.

/// Errors from building a [`Table`](crate::Table) or running a cleaning step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrepError {
    /// Returned when a requested column is not present in the table.
    #[error("column \"{name}\" not found (available: {})", available.join(", "))]
    UnknownColumn {
        /// The requested column name.
        name: String,
        /// Column names present in the table, in order.
        available: Vec<String>,
    },

    /// Returned when the same column name appears twice.
    #[error("duplicate column \"{name}\"")]
    DuplicateColumn {
        /// The repeated column name.
        name: String,
    },

    /// Returned when a column has a different length than the rest of the table.
    #[error("column \"{name}\" has {got} rows, expected {expected}")]
    LengthMismatch {
        /// The offending column.
        name: String,
        /// Row count of the first column.
        expected: usize,
        /// Row count of this column.
        got: usize,
    },

    /// Returned when a numeric operation targets a categorical column.
    #[error("column \"{name}\" is categorical, a numeric column is required")]
    NotNumeric {
        /// The categorical column name.
        name: String,
    },

    /// Returned when the outlier multiplier is not a positive finite number.
    #[error("n_std must be a positive finite number, got {n_std}")]
    InvalidStdMultiplier {
        /// The rejected multiplier.
        n_std: f64,
    },

    /// Returned when the smoothing factor is outside (0, 1].
    #[error("alpha must be in (0, 1], got {alpha}")]
    InvalidAlpha {
        /// The rejected smoothing factor.
        alpha: f64,
    },

    /// Returned when a column has too few observed values for a standard deviation.
    #[error("column \"{column}\" has {observed} observed values, need at least 2")]
    InsufficientObservations {
        /// The column being summarised.
        column: String,
        /// Number of non-missing values found.
        observed: usize,
    },

    /// Returned when a column statistic overflows to NaN or infinity.
    #[error("column \"{column}\" produced a non-finite {statistic}")]
    NonFiniteStatistic {
        /// The column being summarised.
        column: String,
        /// Which statistic failed ("mean" or "std").
        statistic: &'static str,
    },
}

impl PrepError {
    /// Whether the failure comes from the data itself rather than from the
    /// caller's parameters or schema.
    ///
    /// Recoverable failures may be skipped by a [`PrepPlan`](crate::PrepPlan)
    /// running with [`FailurePolicy::SkipStage`](crate::FailurePolicy::SkipStage).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PrepError::InsufficientObservations { .. } | PrepError::NonFiniteStatistic { .. }
        )
    }
}
