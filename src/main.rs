mod pipeline;
mod serve;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cerrado_io::{ExperimentName, ResultWriter, TableReader};
use cerrado_rf::{RandomForest, RankedFeature};

use crate::pipeline::{LABEL_COLUMN, PrepOptions, TrainOptions};

#[derive(Parser)]
#[command(name = "cerrado")]
#[command(about = "Plant-nutrient cleaning pipeline and Cerrado physiognomy classifier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the split and the forest
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input file layout.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Path to the input CSV file
    #[arg(long)]
    data: PathBuf,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Decimal separator for numeric cells
    #[arg(long, default_value_t = '.')]
    decimal: char,
}

/// Cleaning parameters shared by training and prediction.
#[derive(Args, Debug, Clone)]
struct CleanArgs {
    /// Outlier threshold in standard deviations above the column mean
    #[arg(long, default_value_t = cerrado_prep::DEFAULT_N_STD)]
    n_std: f64,

    /// EWMA smoothing factor in (0, 1]
    #[arg(long, default_value_t = cerrado_prep::DEFAULT_ALPHA)]
    alpha: f64,

    /// Use the recursive (unadjusted) EWMA form
    #[arg(long, default_value_t = false)]
    no_adjust: bool,

    /// Pass a stage's input through when it fails on degenerate data
    #[arg(long, default_value_t = false)]
    skip_failed_stages: bool,
}

/// Output naming.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the survey table, train a forest and evaluate it on a held-out split
    Train {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        clean: CleanArgs,

        /// Feature columns (defaults to the seven nutrient columns)
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Label column
        #[arg(long, default_value = LABEL_COLUMN)]
        label: String,

        /// Held-out fraction in (0, 1)
        #[arg(long, default_value_t = 0.3)]
        test_size: f64,

        /// Number of trees in the Random Forest
        #[arg(long, default_value_t = 100)]
        n_trees: usize,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Clean a table on a saved model's features and predict every row
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        clean: CleanArgs,

        /// Also drop rows above the outlier threshold computed on this batch
        #[arg(long, default_value_t = false)]
        trim_outliers: bool,
    },

    /// Serve a saved model over HTTP
    Serve {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Address to bind
        #[arg(long, env = "CERRADO_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to bind
        #[arg(long, env = "CERRADO_PORT", default_value_t = 8000)]
        port: u16,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput<'a> {
    experiment: String,
    rows_loaded: usize,
    rows_prepared: usize,
    n_train: usize,
    n_test: usize,
    accuracy: f64,
    n_trees: usize,
    feature_importances: &'a [RankedFeature],
    evaluation: PathBuf,
    model: PathBuf,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    rows_loaded: usize,
    n_predicted: usize,
    n_skipped: usize,
    model_n_trees: usize,
    model_n_classes: usize,
    predictions: PathBuf,
}

fn ascii_byte(c: char, flag: &str) -> Result<u8> {
    if !c.is_ascii() {
        bail!("--{flag} must be a single ASCII character, got {c:?}");
    }
    Ok(c as u8)
}

fn table_reader(input: &InputArgs) -> Result<TableReader> {
    Ok(TableReader::new(&input.data)
        .with_delimiter(ascii_byte(input.delimiter, "delimiter")?)
        .with_decimal(ascii_byte(input.decimal, "decimal")?))
}

fn prep_options(
    clean: &CleanArgs,
    features: Option<Vec<String>>,
    trim_outliers: bool,
) -> PrepOptions {
    let defaults = PrepOptions::default();
    PrepOptions {
        features: features.unwrap_or(defaults.features),
        trim_outliers,
        n_std: clean.n_std,
        alpha: clean.alpha,
        adjust: !clean.no_adjust,
        skip_failed_stages: clean.skip_failed_stages,
    }
}

fn load_model(path: &Path) -> Result<RandomForest> {
    let forest = RandomForest::load(path).context("failed to load model")?;
    info!(
        n_trees = forest.n_trees(),
        n_features = forest.n_features(),
        n_classes = forest.n_classes(),
        "model loaded"
    );
    Ok(forest)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            input,
            output,
            clean,
            features,
            label,
            test_size,
            n_trees,
            max_depth,
        } => {
            let reader = table_reader(&input)?;
            let prep = prep_options(&clean, features, true);
            let train = TrainOptions {
                label,
                test_size,
                n_trees,
                max_depth,
                seed: cli.seed,
            };
            let experiment = ExperimentName::new(output.experiment.clone())?;
            let writer = ResultWriter::new(&output.output_dir, experiment)?;

            let outcome = pipeline::run_training(&reader, &prep, &train, &writer)
                .context("training run failed")?;

            let summary = TrainOutput {
                experiment: output.experiment,
                rows_loaded: outcome.rows_loaded,
                rows_prepared: outcome.rows_prepared,
                n_train: outcome.n_train,
                n_test: outcome.n_test,
                accuracy: outcome.report.accuracy,
                n_trees: outcome.forest.n_trees(),
                feature_importances: &outcome.importances,
                evaluation: outcome.evaluation_path.clone(),
                model: outcome.model_path.clone(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !cli.quiet {
                println!("\n{}", outcome.report);
                println!("{}", outcome.confusion);
            }
        }

        Command::Predict {
            model,
            input,
            output,
            clean,
            trim_outliers,
        } => {
            let forest = load_model(&model)?;
            let reader = table_reader(&input)?;
            let prep = prep_options(&clean, None, trim_outliers);
            let experiment = ExperimentName::new(output.experiment.clone())?;
            let writer = ResultWriter::new(&output.output_dir, experiment)?;

            let outcome = pipeline::run_prediction(&reader, &forest, &prep, &writer)
                .context("prediction run failed")?;

            let summary = PredictOutput {
                experiment: output.experiment,
                rows_loaded: outcome.rows_loaded,
                n_predicted: outcome.predictions.len(),
                n_skipped: outcome.skipped_rows.len(),
                model_n_trees: forest.n_trees(),
                model_n_classes: forest.n_classes(),
                predictions: outcome.predictions_path,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Serve { model, host, port } => {
            let state = serve::AppState::new(load_model(&model)?)?;
            let addr = SocketAddr::new(host, port);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(serve::serve(state, addr))?;
        }
    }

    Ok(())
}
