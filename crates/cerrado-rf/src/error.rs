use std::path::PathBuf;

/// Errors from random forest training, partitioning, scoring, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The rejected tree count.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The rejected depth.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The rejected value.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The rejected value.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when n_jobs is zero.
    #[error("n_jobs must be at least 1 when set, got {n_jobs}")]
    InvalidJobCount {
        /// The rejected job count.
        n_jobs: usize,
    },

    /// Returned when the dedicated training thread pool cannot be created.
    #[error("failed to build a {n_jobs}-thread training pool")]
    ThreadPool {
        /// Requested thread count.
        n_jobs: usize,
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test fraction must be in (0, 1), got {test_fraction}")]
    InvalidTestFraction {
        /// The rejected fraction.
        test_fraction: f64,
    },

    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the number of feature names differs from the column count.
    #[error("{got} feature names supplied for {expected} feature columns")]
    FeatureNameMismatch {
        /// Number of feature columns.
        expected: usize,
        /// Number of names supplied.
        got: usize,
    },

    /// Returned when features and labels have different lengths.
    #[error("{n_samples} samples but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a label index has no matching class name.
    #[error("sample {sample_index} has label {label}, but only {n_classes} classes are named")]
    LabelOutOfRange {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The label value.
        label: usize,
        /// Number of class names supplied.
        n_classes: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training or prediction value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a class has too few samples to appear on both sides of a split.
    #[error("class {class} has only {count} sample(s), need at least 2 for a stratified split")]
    TooFewSamplesForSplit {
        /// The class label with insufficient samples.
        class: usize,
        /// The number of samples belonging to that class.
        count: usize,
    },

    /// Returned when a train/test split would leave one side empty.
    #[error("{partition} partition would be empty ({n_samples} samples, test fraction {test_fraction})")]
    EmptyPartition {
        /// Which side would be empty: "train" or "test".
        partition: &'static str,
        /// Total number of samples.
        n_samples: usize,
        /// The requested test fraction.
        test_fraction: f64,
    },

    /// Returned when predicted and true labels differ in length.
    #[error("{n_predicted} predictions but {n_truth} true labels")]
    LengthMismatch {
        /// Number of predicted labels.
        n_predicted: usize,
        /// Number of true labels.
        n_truth: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
