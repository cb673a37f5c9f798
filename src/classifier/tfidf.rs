//! TF-IDF text vectorizer.
//!
//! Text is split on any character other than a letter, digit or underscore,
//! lowercased, and tokens
//! shorter than two characters are dropped. Each document becomes a sparse
//! vector of raw term counts weighted by smoothed inverse document frequency
//! and scaled to unit length.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Sparse feature vector as `(feature index, weight)` pairs, sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Splits text into lowercase tokens of two or more characters.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
}

/// Vocabulary and IDF weights learned from a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and IDF weights from `documents`.
    ///
    /// Feature indices follow the lexical order of the terms, so fitting the
    /// same corpus twice yields the same vectorizer.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let terms: BTreeSet<String> = tokenize(document.as_ref()).collect();
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    /// Number of features (vocabulary size).
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    /// Returns whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Checks that every vocabulary index has a finite IDF weight.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((term, &index)) = self
            .vocabulary
            .iter()
            .find(|(_, &index)| index >= self.idf.len())
        {
            return Err(format!(
                "term {:?} has index {} but only {} idf weights",
                term,
                index,
                self.idf.len()
            ));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err("idf weights must be finite".to_string());
        }
        Ok(())
    }

    /// Vectorizes `text`. Terms outside the vocabulary are ignored, so
    /// unseen text produces an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .filter_map(|(index, count)| self.idf.get(index).map(|idf| (index, count * idf)))
            .collect();

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut vector {
                *weight /= norm;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_punctuation_and_drops_short_tokens() {
        let tokens: Vec<String> = tokenize("Urgent: Project-Deadline, a b EOD!").collect();
        assert_eq!(tokens, vec!["urgent", "project", "deadline", "eod"]);
    }

    #[test]
    fn underscore_is_a_word_character() {
        let tokens: Vec<String> = tokenize("see FOO_bar-baz").collect();
        assert_eq!(tokens, vec!["see", "foo_bar", "baz"]);
    }

    #[test]
    fn validate_rejects_index_past_idf() {
        let mut vectorizer = TfidfVectorizer::fit(&["meeting agenda", "weekly newsletter"]);
        assert!(vectorizer.validate().is_ok());

        vectorizer.idf.truncate(1);
        assert!(vectorizer.validate().is_err());
        // Out-of-range features are dropped rather than indexed.
        assert!(vectorizer.transform("weekly newsletter").is_empty());
    }

    #[test]
    fn vocabulary_is_lexically_ordered() {
        let vectorizer = TfidfVectorizer::fit(&["zeta alpha", "beta"]);
        assert_eq!(vectorizer.len(), 3);
        let vector = vectorizer.transform("alpha");
        assert_eq!(vector.len(), 1);
        assert_eq!(vector[0].0, 0);
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let vectorizer = TfidfVectorizer::fit(&["common rare", "common", "common"]);
        let vector = vectorizer.transform("common rare");
        let common = vector[0].1;
        let rare = vector[1].1;
        assert!(rare > common);
    }

    #[test]
    fn vectors_have_unit_length() {
        let vectorizer = TfidfVectorizer::fit(&["meeting agenda", "team sync meeting"]);
        let vector = vectorizer.transform("meeting agenda meeting");
        let norm: f64 = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unseen_text_is_empty_vector() {
        let vectorizer = TfidfVectorizer::fit(&["meeting agenda"]);
        assert!(vectorizer.transform("completely different words").is_empty());
        assert!(vectorizer.transform("").is_empty());
    }
}
