//! ChurnForge: customer churn prediction from account attributes
//!
//! This library provides an offline training pipeline (CSV loading, cleaning,
//! feature engineering, logistic regression fitting, cross-validation and
//! hyperparameter search) and a thin prediction service that loads the
//! persisted artifacts and scores single customers.

pub mod cli;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod record;
pub mod serve;
pub mod tuning;

// Re-export public items for easier access
pub use cli::{Cli, Commands};
pub use data::{load_training_data, stratified_split, TrainingData};
pub use error::ChurnError;
pub use features::{assemble, FeatureRow, TenureBucketizer};
pub use model::{FittedLogisticRegression, LogisticRegression, Penalty, ProbabilisticClassifier};
pub use pipeline::{ChurnPipeline, ModelArtifacts};
pub use preprocess::FittedPreprocessor;
pub use record::CustomerRecord;
pub use serve::{PredictionResult, PredictionService};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
