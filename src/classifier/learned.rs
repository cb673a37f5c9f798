//! Learned text classifier.
//!
//! A [`TrainedModel`] pairs a [`TfidfVectorizer`] with a multinomial
//! logistic regression over the categories seen in training. Models are
//! plain values: the caller trains or loads one and passes it wherever
//! classification is needed.
//!
//! # Example
//!
//! ```ignore
//! use inbox_agent::classifier::{train, fallback_corpus, Classifier};
//! use inbox_agent::domain::EmailView;
//!
//! let model = train(&fallback_corpus())?;
//! let category = model.classify(&EmailView::new("Team Sync Meeting", "", ""));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{Category, EmailView};

use super::tfidf::{SparseVector, TfidfVectorizer};
use super::{Classifier, ClassifierError, Result};

/// A labeled training document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Document text.
    pub text: String,
    /// Category the document belongs to.
    pub label: Category,
}

impl TrainingExample {
    /// Creates an example from raw text.
    pub fn new(text: impl Into<String>, label: Category) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }

    /// Creates an example from an email view, using the same feature text
    /// the model sees at inference time.
    pub fn from_view(view: &EmailView, label: Category) -> Self {
        Self::new(view.feature_text(), label)
    }
}

/// Gradient descent parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Number of full-batch gradient steps.
    pub iterations: usize,
    /// Step size.
    pub learning_rate: f64,
    /// L2 penalty on the weights (biases are not penalized).
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 1.0,
            l2: 1e-3,
        }
    }
}

/// Result of classifying one email with a trained model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Most likely category.
    pub category: Category,
    /// Probability the model assigns to `category`.
    pub confidence: f64,
}

/// A trained TF-IDF + logistic regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    vectorizer: TfidfVectorizer,
    classes: Vec<Category>,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl TrainedModel {
    /// Categories this model can predict, in tie-break order.
    pub fn classes(&self) -> &[Category] {
        &self.classes
    }

    /// Vocabulary size.
    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.len()
    }

    /// Checks that the vectorizer, class list, weights and biases agree in
    /// shape. Run on every loaded model so inference cannot index out of
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidModel`] describing the first
    /// mismatch.
    pub fn validate(&self) -> Result<()> {
        self.vectorizer
            .validate()
            .map_err(ClassifierError::InvalidModel)?;

        let k = self.classes.len();
        if k == 0 {
            return Err(ClassifierError::InvalidModel("model has no classes".to_string()));
        }
        if self.weights.len() != k || self.biases.len() != k {
            return Err(ClassifierError::InvalidModel(format!(
                "{} classes but {} weight rows and {} biases",
                k,
                self.weights.len(),
                self.biases.len()
            )));
        }

        let d = self.vectorizer.len();
        if let Some(row) = self.weights.iter().position(|row| row.len() != d) {
            return Err(ClassifierError::InvalidModel(format!(
                "weight row {} has {} entries, vocabulary has {}",
                row,
                self.weights[row].len(),
                d
            )));
        }
        if self
            .weights
            .iter()
            .flatten()
            .chain(&self.biases)
            .any(|w| !w.is_finite())
        {
            return Err(ClassifierError::InvalidModel("parameters must be finite".to_string()));
        }
        Ok(())
    }

    /// Predicts the category of `view` along with its probability.
    ///
    /// Text made only of unseen words yields an empty feature vector; the
    /// biases then decide, so a category is always returned.
    pub fn predict(&self, view: &EmailView) -> Prediction {
        let features = self.vectorizer.transform(&view.feature_text());
        let probabilities = softmax(&self.scores(&features));

        let mut best: Option<(usize, f64)> = None;
        for (index, &p) in probabilities.iter().enumerate() {
            if best.map_or(true, |(_, top)| p > top) {
                best = Some((index, p));
            }
        }

        match best.and_then(|(index, p)| self.classes.get(index).map(|&c| (c, p))) {
            Some((category, confidence)) => Prediction {
                category,
                confidence,
            },
            None => Prediction {
                category: Category::Personal,
                confidence: 0.0,
            },
        }
    }

    fn scores(&self, features: &SparseVector) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(weights, bias)| bias + dot(weights, features))
            .collect()
    }
}

impl Classifier for TrainedModel {
    fn classify(&self, view: &EmailView) -> Category {
        self.predict(view).category
    }

    fn name(&self) -> &str {
        "learned"
    }
}

/// Trains a model with the default [`TrainingConfig`].
///
/// # Errors
///
/// Returns [`ClassifierError::InsufficientTrainingData`] unless the examples
/// cover at least two categories.
pub fn train(examples: &[TrainingExample]) -> Result<TrainedModel> {
    train_with(examples, TrainingConfig::default())
}

/// Trains a model with explicit gradient descent parameters.
///
/// # Errors
///
/// Returns [`ClassifierError::InsufficientTrainingData`] unless the examples
/// cover at least two categories.
pub fn train_with(examples: &[TrainingExample], config: TrainingConfig) -> Result<TrainedModel> {
    let classes: Vec<Category> = examples
        .iter()
        .map(|e| e.label)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if classes.len() < 2 {
        return Err(ClassifierError::InsufficientTrainingData(format!(
            "need examples from at least two categories, got {} example(s) in {} categor{}",
            examples.len(),
            classes.len(),
            if classes.len() == 1 { "y" } else { "ies" }
        )));
    }

    let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
    let vectorizer = TfidfVectorizer::fit(&texts);
    let rows: Vec<SparseVector> = texts.iter().map(|t| vectorizer.transform(t)).collect();
    let targets: Vec<usize> = examples
        .iter()
        .map(|e| classes.iter().position(|c| *c == e.label).unwrap_or(0))
        .collect();

    let k = classes.len();
    let d = vectorizer.len();
    let n = examples.len() as f64;

    let mut model = TrainedModel {
        vectorizer,
        classes,
        weights: vec![vec![0.0; d]; k],
        biases: vec![0.0; k],
    };

    for _ in 0..config.iterations {
        let mut weight_grad = vec![vec![0.0; d]; k];
        let mut bias_grad = vec![0.0; k];

        for (row, &target) in rows.iter().zip(&targets) {
            let probabilities = softmax(&model.scores(row));
            for (class, p) in probabilities.into_iter().enumerate() {
                let error = if class == target { p - 1.0 } else { p };
                bias_grad[class] += error;
                for &(feature, value) in row {
                    weight_grad[class][feature] += error * value;
                }
            }
        }

        for ((weights, grads), (bias, bias_grad)) in model
            .weights
            .iter_mut()
            .zip(&weight_grad)
            .zip(model.biases.iter_mut().zip(&bias_grad))
        {
            for (w, g) in weights.iter_mut().zip(grads) {
                *w -= config.learning_rate * (g / n + config.l2 * *w);
            }
            *bias -= config.learning_rate * bias_grad / n;
        }
    }

    tracing::debug!(
        examples = examples.len(),
        classes = k,
        vocabulary = d,
        "trained learned classifier"
    );

    Ok(model)
}

fn dot(weights: &[f64], features: &SparseVector) -> f64 {
    features
        .iter()
        .map(|&(index, value)| weights.get(index).copied().unwrap_or(0.0) * value)
        .sum()
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
