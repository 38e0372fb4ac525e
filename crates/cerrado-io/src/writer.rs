//! JSON result writer for evaluation and prediction outputs.

use std::fs;
use std::path::{Path, PathBuf};

use cerrado_rf::{ClassificationReport, ConfusionMatrix, RankedFeature};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Everything recorded about one training run.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSummary<'a> {
    /// Rows read from the input file.
    pub rows_loaded: usize,
    /// Rows left after preparation.
    pub rows_prepared: usize,
    /// Training partition size.
    pub n_train: usize,
    /// Held-out partition size.
    pub n_test: usize,
    /// Ranked feature importances.
    pub importances: &'a [RankedFeature],
    /// Held-out confusion matrix.
    pub confusion: &'a ConfusionMatrix,
    /// Held-out classification report.
    pub report: &'a ClassificationReport,
}

/// The predicted class of one input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Zero-based data row in the input file.
    pub row: usize,
    /// Predicted class name.
    pub label: String,
    /// Averaged tree vote for the predicted class.
    pub probability: f64,
}

/// Writes run artifacts as pretty-printed JSON.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_evaluate.json` and
/// `{experiment}_predict.json`.
#[derive(Debug)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|source| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a training run to `{experiment}_evaluate.json` and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_evaluation(&self, summary: &EvaluationSummary<'_>) -> Result<PathBuf, IoError> {
        let report = summary.report;
        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            accuracy: report.accuracy,
            rows_loaded: summary.rows_loaded,
            rows_prepared: summary.rows_prepared,
            n_train: summary.n_train,
            n_test: summary.n_test,
            feature_importances: summary.importances,
            confusion_matrix: ConfusionArtifact {
                classes: report.classes.iter().map(|c| c.name.as_str()).collect(),
                counts: summary.confusion.as_rows(),
                normalized: summary.confusion.normalized(),
            },
            classification_report: report,
        };

        let path = self.write_json("evaluate", &artifact)?;
        info!(path = %path.display(), accuracy = report.accuracy, "evaluation result written");
        Ok(path)
    }

    /// Write per-row predictions to `{experiment}_predict.json` and return its path.
    ///
    /// `skipped_rows` lists input rows that cleaning removed before prediction.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the artifact cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(n = predictions.len(), n_skipped = skipped_rows.len()))]
    pub fn write_predictions(
        &self,
        predictions: &[Prediction],
        skipped_rows: &[usize],
    ) -> Result<PathBuf, IoError> {
        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            skipped_rows,
            predictions,
        };
        let path = self.write_json("predict", &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }

    fn write_json(&self, suffix: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{suffix}.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(artifact).map_err(|source| IoError::SerializeJson {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| IoError::WriteFile {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    accuracy: f64,
    rows_loaded: usize,
    rows_prepared: usize,
    n_train: usize,
    n_test: usize,
    feature_importances: &'a [RankedFeature],
    confusion_matrix: ConfusionArtifact<'a>,
    classification_report: &'a ClassificationReport,
}

#[derive(Serialize)]
struct ConfusionArtifact<'a> {
    classes: Vec<&'a str>,
    counts: &'a [Vec<usize>],
    normalized: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    skipped_rows: &'a [usize],
    predictions: &'a [Prediction],
}
