//! Email classification.
//!
//! Two interchangeable classifiers sit behind the [`Classifier`] trait:
//!
//! - [`RuleClassifier`] - ordered keyword rules, first match wins
//! - [`TrainedModel`] - TF-IDF features with logistic regression
//!
//! Both are total: any [`EmailView`] maps to some [`Category`].

mod corpus;
mod learned;
mod rules;
mod store;
mod tfidf;

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Category, EmailView};

pub use corpus::fallback_corpus;
pub use learned::{train, train_with, Prediction, TrainedModel, TrainingConfig, TrainingExample};
pub use rules::{classify_rule_based, KeywordRule, RuleClassifier, DEFAULT_RULES};
pub use store::{ModelStore, MODEL_FILE_NAME};
pub use tfidf::{tokenize, SparseVector, TfidfVectorizer};

/// Errors from training or loading a learned model.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Training data does not cover enough categories.
    #[error("insufficient training data: {0}")]
    InsufficientTrainingData(String),

    /// No model has been persisted at the given path.
    #[error("no persisted model at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Reading or writing the model file failed.
    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model file parsed but its parts do not fit together.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The model file could not be encoded or decoded.
    #[error("model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Assigns a category to an email.
pub trait Classifier: Send + Sync {
    /// Classifies the view. Never fails.
    fn classify(&self, view: &EmailView) -> Category;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
