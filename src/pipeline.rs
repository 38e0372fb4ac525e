//! Stage-by-stage driver: load, prepare, split, train, evaluate, report, persist.

use std::fmt;
use std::path::PathBuf;

use cerrado_io::{
    EvaluationSummary, LabeledData, Prediction, ResultWriter, TableReader, feature_matrix,
};
use cerrado_prep::{Axis, FailurePolicy, How, PrepPlan, Table};
use cerrado_rf::{
    ClassificationReport, ConfusionMatrix, RandomForest, RandomForestConfig, RankedFeature,
    classification_report,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// The seven nutrient columns of the survey sheet, in model feature order.
pub const NUTRIENT_COLUMNS: [&str; 7] = [
    "N(g kg-1)",
    "P(g kg-1)",
    "K(g kg-1)",
    "Ca(g kg-1)",
    "Mg(g kg-1)",
    "Fe(mg kg-1)",
    "Mn(mg kg-1)",
];

/// Default label column.
pub const LABEL_COLUMN: &str = "Vegetation";

/// A pipeline stage, named in failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the input table.
    Load,
    /// Running the cleaning plan.
    Prepare,
    /// Extracting features and labels.
    Label,
    /// Stratified train/test split.
    Split,
    /// Forest fitting.
    Train,
    /// Scoring on the held-out rows.
    Evaluate,
    /// Writing JSON artifacts.
    Report,
    /// Saving or loading the model.
    Persist,
    /// Batch inference.
    Predict,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Prepare => "prepare",
            Stage::Label => "label",
            Stage::Split => "split",
            Stage::Train => "train",
            Stage::Evaluate => "evaluate",
            Stage::Report => "report",
            Stage::Persist => "persist",
            Stage::Predict => "predict",
        };
        f.write_str(name)
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed")]
pub struct PipelineError {
    /// The failing stage.
    pub stage: Stage,
    /// The underlying error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E> AtStage<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError {
            stage,
            source: Box::new(e),
        })
    }
}

/// Cleaning parameters shared by training and batch prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepOptions {
    /// Numeric feature columns, in model order.
    pub features: Vec<String>,
    /// Drop rows above the outlier threshold.
    pub trim_outliers: bool,
    /// Outlier threshold in standard deviations.
    pub n_std: f64,
    /// EWMA decay.
    pub alpha: f64,
    /// Bias-corrected EWMA weights.
    pub adjust: bool,
    /// Pass a recoverably failing stage's input through instead of halting.
    pub skip_failed_stages: bool,
}

impl Default for PrepOptions {
    fn default() -> Self {
        Self {
            features: NUTRIENT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            trim_outliers: true,
            n_std: cerrado_prep::DEFAULT_N_STD,
            alpha: cerrado_prep::DEFAULT_ALPHA,
            adjust: true,
            skip_failed_stages: false,
        }
    }
}

impl PrepOptions {
    /// subset → drop missing rows → trim outliers → smooth, carrying `extra` columns along.
    ///
    /// The trim is left out when `trim_outliers` is off.
    pub fn plan(&self, extra: Option<&str>) -> PrepPlan {
        let policy = if self.skip_failed_stages {
            FailurePolicy::SkipStage
        } else {
            FailurePolicy::Halt
        };
        let mut plan = PrepPlan::new()
            .select(self.features.iter().map(String::as_str).chain(extra))
            .drop_missing(Axis::Rows, How::Any);
        if self.trim_outliers {
            plan = plan.remove_outliers(&self.features, self.n_std);
        }
        plan.smooth(&self.features, self.alpha, self.adjust)
            .with_failure_policy(policy)
    }
}

/// Split and forest parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Label column name.
    pub label: String,
    /// Held-out fraction.
    pub test_size: f64,
    /// Forest size.
    pub n_trees: usize,
    /// Tree depth limit.
    pub max_depth: Option<usize>,
    /// Seed for both the split and the forest.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            label: LABEL_COLUMN.to_string(),
            test_size: 0.3,
            n_trees: 100,
            max_depth: None,
            seed: 0,
        }
    }
}

/// Everything a training run produced.
#[derive(Debug)]
pub struct TrainOutcome {
    /// Rows in the input file.
    pub rows_loaded: usize,
    /// Rows after cleaning.
    pub rows_prepared: usize,
    /// Training partition size.
    pub n_train: usize,
    /// Held-out partition size.
    pub n_test: usize,
    /// Ranked MDI importances.
    pub importances: Vec<RankedFeature>,
    /// Held-out confusion matrix.
    pub confusion: ConfusionMatrix,
    /// Held-out per-class report.
    pub report: ClassificationReport,
    /// The fitted model.
    pub forest: RandomForest,
    /// Path of the evaluation artifact.
    pub evaluation_path: PathBuf,
    /// Path of the saved model.
    pub model_path: PathBuf,
}

/// The cleaned table, the input row count, and each cleaned row's input position.
fn load_and_prepare(
    reader: &TableReader,
    prep: &PrepOptions,
    extra: Option<&str>,
) -> Result<(Table, usize, Vec<usize>), PipelineError> {
    let raw = reader.read().at(Stage::Load)?;
    let (prepared, origin) = prep.plan(extra).apply_indexed(&raw).at(Stage::Prepare)?;
    info!(rows_in = raw.n_rows(), rows_out = prepared.n_rows(), "table prepared");
    Ok((prepared, raw.n_rows(), origin))
}

/// Run a full training pass and write its artifacts through `writer`.
///
/// # Errors
///
/// Returns a [`PipelineError`] naming the first stage that failed. Nothing
/// is trained or written after a failure.
#[instrument(skip_all, fields(path = %reader.path().display(), n_trees = train.n_trees))]
pub fn run_training(
    reader: &TableReader,
    prep: &PrepOptions,
    train: &TrainOptions,
    writer: &ResultWriter,
) -> Result<TrainOutcome, PipelineError> {
    let (prepared, rows_loaded, _) = load_and_prepare(reader, prep, Some(&train.label))?;

    let data = LabeledData::from_table(&prepared, &prep.features, &train.label).at(Stage::Label)?;
    let split = data.split(train.test_size, train.seed).at(Stage::Split)?;

    let result = RandomForestConfig::new(train.n_trees)
        .and_then(|cfg| {
            cfg.with_seed(train.seed)
                .with_max_depth(train.max_depth)
                .fit(&split.x_train, &split.y_train, data.feature_names(), data.class_names())
        })
        .at(Stage::Train)?;

    let predicted = result
        .forest()
        .predict_batch(&split.x_test)
        .at(Stage::Evaluate)?;
    let confusion = ConfusionMatrix::from_labels(&split.y_test, &predicted, data.class_names().len())
        .at(Stage::Evaluate)?;
    let report =
        classification_report(&predicted, &split.y_test, data.class_names()).at(Stage::Evaluate)?;
    info!(accuracy = report.accuracy, "held-out evaluation complete");

    let evaluation_path = writer
        .write_evaluation(&EvaluationSummary {
            rows_loaded,
            rows_prepared: prepared.n_rows(),
            n_train: split.x_train.len(),
            n_test: split.x_test.len(),
            importances: result.importances(),
            confusion: &confusion,
            report: &report,
        })
        .at(Stage::Report)?;

    let model_path = writer.model_path();
    result.forest().save(&model_path).at(Stage::Persist)?;

    let importances = result.importances().to_vec();
    Ok(TrainOutcome {
        rows_loaded,
        rows_prepared: prepared.n_rows(),
        n_train: split.x_train.len(),
        n_test: split.x_test.len(),
        importances,
        confusion,
        report,
        forest: result.into_forest(),
        evaluation_path,
        model_path,
    })
}

/// Result of a batch prediction run.
#[derive(Debug)]
pub struct PredictOutcome {
    /// Rows in the input file.
    pub rows_loaded: usize,
    /// One prediction per prepared row, tagged with its input row.
    pub predictions: Vec<Prediction>,
    /// Input rows removed by cleaning, ascending.
    pub skipped_rows: Vec<usize>,
    /// Path of the predictions artifact.
    pub predictions_path: PathBuf,
}

/// Clean `reader`'s table on the model's feature columns and predict every row.
///
/// `prep.features` is replaced by the model's own feature names. Rows the
/// cleaning removes are reported in [`PredictOutcome::skipped_rows`].
///
/// # Errors
///
/// Returns a [`PipelineError`] naming the first stage that failed.
#[instrument(skip_all, fields(path = %reader.path().display(), n_trees = forest.n_trees()))]
pub fn run_prediction(
    reader: &TableReader,
    forest: &RandomForest,
    prep: &PrepOptions,
    writer: &ResultWriter,
) -> Result<PredictOutcome, PipelineError> {
    let prep = PrepOptions {
        features: forest.feature_names().to_vec(),
        ..prep.clone()
    };
    let (prepared, rows_loaded, origin) = load_and_prepare(reader, &prep, None)?;

    let skipped_rows: Vec<usize> = {
        let mut kept = origin.iter().copied().peekable();
        (0..rows_loaded)
            .filter(|&row| kept.next_if_eq(&row).is_none())
            .collect()
    };
    if !skipped_rows.is_empty() {
        warn!(
            n_skipped = skipped_rows.len(),
            rows = ?skipped_rows,
            "input rows removed by cleaning"
        );
    }

    let rows = feature_matrix(&prepared, &prep.features).at(Stage::Label)?;
    let predictions: Vec<Prediction> = forest
        .predict_proba_batch(&rows)
        .at(Stage::Predict)?
        .into_iter()
        .zip(origin)
        .map(|(dist, row)| Prediction {
            row,
            label: forest.class_names()[dist.predicted_class()].clone(),
            probability: dist.confidence(),
        })
        .collect();

    let predictions_path = writer
        .write_predictions(&predictions, &skipped_rows)
        .at(Stage::Report)?;
    Ok(PredictOutcome {
        rows_loaded,
        predictions,
        skipped_rows,
        predictions_path,
    })
}
