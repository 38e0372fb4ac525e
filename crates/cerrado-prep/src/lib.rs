//! Table model and cleaning operations for plant-nutrient data.
//!
//! Every operation borrows a [`Table`] and returns a new one:
//!
//! - [`select_subset`] projects onto named columns
//! - [`drop_missing`] removes rows or columns holding missing cells
//! - [`remove_outliers`] trims rows above `mean + n_std * std`
//! - [`smooth`] applies an exponentially weighted moving average
//!
//! [`PrepPlan`] chains them into a fixed sequence.

pub mod column;
pub mod error;
pub mod missing;
pub mod outlier;
pub mod plan;
pub mod smooth;
pub mod stats;
pub mod subset;
pub mod table;

pub use column::{Column, ColumnKind};
pub use error::PrepError;
pub use missing::{Axis, How, drop_missing};
pub use outlier::{DEFAULT_N_STD, remove_outliers};
pub use plan::{FailurePolicy, PrepPlan, PrepStage, StepError};
pub use smooth::{DEFAULT_ALPHA, smooth};
pub use stats::ColumnSummary;
pub use subset::select_subset;
pub use table::Table;
