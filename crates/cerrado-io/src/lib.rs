//! File I/O for the cerrado pipeline: CSV tables in, labelled datasets out,
//! JSON artifacts written.

mod dataset;
mod domain;
mod error;
mod reader;
mod writer;

pub use dataset::{LabeledData, feature_matrix};
pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::{MISSING_TOKENS, TableReader};
pub use writer::{EvaluationSummary, Prediction, ResultWriter};
