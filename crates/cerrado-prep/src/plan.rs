//! An ordered sequence of cleaning steps applied to a table.

use std::fmt;

use tracing::{info, instrument, warn};

use crate::error::PrepError;
use crate::missing::{Axis, How, drop_missing_tracked};
use crate::outlier::remove_outliers_tracked;
use crate::smooth::smooth;
use crate::subset::select_subset;
use crate::table::Table;

/// The kind of a recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepStage {
    /// Column projection.
    SelectSubset,
    /// Missing-value removal.
    DropMissing,
    /// Outlier trimming.
    RemoveOutliers,
    /// EWMA smoothing.
    Smooth,
}

impl fmt::Display for PrepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrepStage::SelectSubset => "select_subset",
            PrepStage::DropMissing => "drop_missing",
            PrepStage::RemoveOutliers => "remove_outliers",
            PrepStage::Smooth => "smooth",
        };
        f.write_str(name)
    }
}

/// What [`PrepPlan::apply`] does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing step.
    #[default]
    Halt,
    /// Pass the step's input through unchanged when the failure is
    /// [recoverable](PrepError::is_recoverable). Other failures still halt.
    SkipStage,
}

/// A failed step inside a [`PrepPlan`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("step {step} ({stage}) failed: {source}")]
pub struct StepError {
    /// Zero-based position of the step in the plan.
    pub step: usize,
    /// The kind of step that failed.
    pub stage: PrepStage,
    /// The underlying failure.
    pub source: PrepError,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Select(Vec<String>),
    DropMissing(Axis, How),
    RemoveOutliers { columns: Vec<String>, n_std: f64 },
    Smooth { columns: Vec<String>, alpha: f64, adjust: bool },
}

impl Step {
    fn stage(&self) -> PrepStage {
        match self {
            Step::Select(_) => PrepStage::SelectSubset,
            Step::DropMissing(..) => PrepStage::DropMissing,
            Step::RemoveOutliers { .. } => PrepStage::RemoveOutliers,
            Step::Smooth { .. } => PrepStage::Smooth,
        }
    }

    /// Output table, plus the kept input rows when the step removes any.
    fn run(&self, table: &Table) -> Result<(Table, Option<Vec<usize>>), PrepError> {
        match self {
            Step::Select(columns) => Ok((select_subset(table, columns)?, None)),
            Step::DropMissing(axis, how) => Ok(drop_missing_tracked(table, *axis, *how)),
            Step::RemoveOutliers { columns, n_std } => {
                let (out, kept) = remove_outliers_tracked(table, columns, *n_std)?;
                Ok((out, Some(kept)))
            }
            Step::Smooth {
                columns,
                alpha,
                adjust,
            } => Ok((smooth(table, columns, *alpha, *adjust)?, None)),
        }
    }
}

/// Builder for a deterministic cleaning sequence.
///
/// Steps run in the order they were added, each receiving the previous
/// step's output.
///
/// ```
/// use cerrado_prep::{Axis, How, PrepPlan};
///
/// let plan = PrepPlan::new()
///     .select(["N", "P", "Vegetation"])
///     .drop_missing(Axis::Rows, How::Any)
///     .remove_outliers(["N", "P"], 3.0)
///     .smooth(["N", "P"], 0.5, true);
/// assert_eq!(plan.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepPlan {
    steps: Vec<Step>,
    policy: FailurePolicy,
}

fn owned<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Vec<String> {
    columns.into_iter().map(Into::into).collect()
}

impl PrepPlan {
    /// Create an empty plan with [`FailurePolicy::Halt`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column projection.
    #[must_use]
    pub fn select<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.steps.push(Step::Select(owned(columns)));
        self
    }

    /// Append a missing-value removal.
    #[must_use]
    pub fn drop_missing(mut self, axis: Axis, how: How) -> Self {
        self.steps.push(Step::DropMissing(axis, how));
        self
    }

    /// Append an outlier trim over `columns`.
    #[must_use]
    pub fn remove_outliers<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
        n_std: f64,
    ) -> Self {
        self.steps.push(Step::RemoveOutliers {
            columns: owned(columns),
            n_std,
        });
        self
    }

    /// Append EWMA smoothing over `columns`.
    #[must_use]
    pub fn smooth<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
        alpha: f64,
        adjust: bool,
    ) -> Self {
        self.steps.push(Step::Smooth {
            columns: owned(columns),
            alpha,
            adjust,
        });
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return the failure policy.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Return the number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Return true if the plan has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Return the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<PrepStage> {
        self.steps.iter().map(Step::stage).collect()
    }

    /// Run every step against `table`.
    ///
    /// `table` itself is never modified. An empty plan returns a copy.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] for the first step that fails, unless the policy
    /// is [`FailurePolicy::SkipStage`] and the failure is recoverable.
    pub fn apply(&self, table: &Table) -> Result<Table, StepError> {
        self.apply_indexed(table).map(|(out, _)| out)
    }

    /// Like [`apply`](Self::apply), also returning for each output row its
    /// position in `table`.
    ///
    /// # Errors
    ///
    /// Same as [`apply`](Self::apply).
    #[instrument(skip_all, fields(n_steps = self.steps.len(), n_rows = table.n_rows()))]
    pub fn apply_indexed(&self, table: &Table) -> Result<(Table, Vec<usize>), StepError> {
        let mut current = table.clone();
        let mut origin: Vec<usize> = (0..table.n_rows()).collect();
        for (step, s) in self.steps.iter().enumerate() {
            let stage = s.stage();
            match s.run(&current) {
                Ok((next, kept)) => {
                    info!(step, %stage, rows_in = current.n_rows(), rows_out = next.n_rows(), "step complete");
                    if let Some(kept) = kept {
                        origin = kept.iter().map(|&row| origin[row]).collect();
                    }
                    current = next;
                }
                Err(source)
                    if self.policy == FailurePolicy::SkipStage && source.is_recoverable() =>
                {
                    warn!(step, %stage, error = %source, "step skipped");
                }
                Err(source) => {
                    return Err(StepError {
                        step,
                        stage,
                        source,
                    });
                }
            }
        }
        Ok((current, origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn table() -> Table {
        Table::new(vec![
            (
                "N".into(),
                Column::Numeric(vec![Some(1.0), Some(2.0), None, Some(1.5), Some(1.2)]),
            ),
            ("Zn".into(), Column::from_values([0.0; 5])),
            (
                "Vegetation".into(),
                Column::from_labels(["a", "b", "a", "b", "a"]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn steps_run_in_order() {
        let plan = PrepPlan::new()
            .select(["N", "Vegetation"])
            .drop_missing(Axis::Rows, How::Any)
            .smooth(["N"], 1.0, true);
        let out = plan.apply(&table()).unwrap();
        assert_eq!(out.column_names(), &["N", "Vegetation"]);
        assert_eq!(out.n_rows(), 4);
        assert_eq!(
            plan.stages(),
            vec![PrepStage::SelectSubset, PrepStage::DropMissing, PrepStage::Smooth]
        );
    }

    #[test]
    fn failure_names_step_and_stage() {
        let plan = PrepPlan::new()
            .drop_missing(Axis::Rows, How::Any)
            .smooth(["Vegetation"], 0.5, true);
        let err = plan.apply(&table()).unwrap_err();
        assert_eq!(err.step, 1);
        assert_eq!(err.stage, PrepStage::Smooth);
        assert!(matches!(err.source, PrepError::NotNumeric { .. }));
        assert!(err.to_string().starts_with("step 1 (smooth) failed"));
    }

    #[test]
    fn skip_policy_passes_recoverable_failures_through() {
        // a single surviving row leaves no defined std
        let src = table().take_rows(&[0]);
        let plan = PrepPlan::new()
            .remove_outliers(["N"], 3.0)
            .smooth(["N"], 1.0, true);

        let err = plan.apply(&src).unwrap_err();
        assert_eq!(err.stage, PrepStage::RemoveOutliers);

        let out = plan
            .clone()
            .with_failure_policy(FailurePolicy::SkipStage)
            .apply(&src)
            .unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn skip_policy_still_halts_on_config_errors() {
        let plan = PrepPlan::new()
            .smooth(["N"], 0.0, true)
            .with_failure_policy(FailurePolicy::SkipStage);
        let err = plan.apply(&table()).unwrap_err();
        assert!(matches!(err.source, PrepError::InvalidAlpha { .. }));
    }

    #[test]
    fn indexed_apply_maps_rows_to_input() {
        // row 2 has a missing N; row 1 (N = 2.0) sits above mean + 1 std
        let plan = PrepPlan::new()
            .drop_missing(Axis::Rows, How::Any)
            .remove_outliers(["N"], 1.0)
            .smooth(["N"], 1.0, true);
        let (out, origin) = plan.apply_indexed(&table()).unwrap();
        assert_eq!(origin, vec![0, 3, 4]);
        assert_eq!(out.numeric("N").unwrap(), &[Some(1.0), Some(1.5), Some(1.2)]);
        assert_eq!(plan.apply(&table()).unwrap(), out);
    }

    #[test]
    fn indexed_apply_keeps_all_rows_when_nothing_drops() {
        let plan = PrepPlan::new()
            .select(["N", "Vegetation"])
            .smooth(["N"], 0.5, true);
        let (out, origin) = plan.apply_indexed(&table()).unwrap();
        assert_eq!(out.n_rows(), 5);
        assert_eq!(origin, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_plan_is_identity() {
        let plan = PrepPlan::new();
        assert!(plan.is_empty());
        assert_eq!(plan.apply(&table()).unwrap(), table());
    }
}
