// Machine Learning Module

pub mod artifact;
pub mod baseline;
pub mod forest;
pub mod metrics;
pub mod split;
pub mod trainer;
pub mod tree;

// Expose key types and functions
pub use artifact::{ModelArtifact, FEATURE_NAMES};
pub use forest::{ForestParams, RandomForestRegressor};
pub use metrics::mean_squared_error;
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{Trainer, TrainingReport};
pub use tree::{RegressionTree, TreeParams};
