//! TF-IDF vectorizer over unigrams and bigrams.

use super::{ngrams, tokenize};
use crate::error::{LearningError, Result};
use crate::estimators::SparseRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Converts documents into L2-normalised TF-IDF rows.
///
/// Raw term counts are weighted by the smoothed inverse document frequency
/// `ln((1 + n) / (1 + df)) + 1`. Terms are indexed in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary and document frequencies of `documents`.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let terms: BTreeSet<String> = ngrams(&tokenize(doc.as_ref())).into_iter().collect();
            for term in terms {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(LearningError::InvalidData(
                "empty vocabulary; documents may only contain stop words".to_string(),
            ));
        }

        let n = documents.len() as f64;
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = document_frequency
            .into_keys()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();

        debug!(
            "Fitted TF-IDF vocabulary: {} terms from {} documents",
            self.vocabulary.len(),
            documents.len()
        );
        Ok(())
    }

    /// Vectorize `documents` with the fitted vocabulary.
    ///
    /// Unknown terms are ignored; a document with no known terms becomes an
    /// empty row.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<SparseRow>> {
        if self.vocabulary.is_empty() {
            return Err(LearningError::InferenceError(
                "vectorizer is not fitted".to_string(),
            ));
        }
        Ok(documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect())
    }

    /// [`fit`](Self::fit) followed by [`transform`](Self::transform).
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseRow>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    fn transform_one(&self, document: &str) -> SparseRow {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in ngrams(&tokenize(document)) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|(_, v)| *v /= norm);
        }
        row
    }

    /// Number of terms in the vocabulary.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column index of `term`, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Learned inverse document frequencies, indexed like the vocabulary.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}
