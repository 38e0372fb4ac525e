//! Random forest classification: partition, train, evaluate, predict, persist.
//!
//! CART decision trees with Gini/Entropy split criteria, trained in parallel
//! on bootstrap samples via rayon. Results are deterministic for a given seed
//! whatever the thread count. Also provides a stratified train/test split,
//! mean-decrease-in-impurity importances, confusion matrices, and a
//! per-class classification report.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod node;
mod partition;
mod predict;
mod report;
mod result;
mod serialize;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use partition::{SplitDataset, train_test_split};
pub use predict::ClassDistribution;
pub use report::{AverageScores, ClassReport, ClassificationReport, accuracy, classification_report};
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::DecisionTree;
