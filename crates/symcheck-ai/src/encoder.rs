//! Maps free-text symptoms onto the model's binary feature vector.

use std::collections::HashMap;

use symcheck_core::normalize_term;
use tracing::{debug, warn};

use crate::vocab::TermTable;

/// Fixed-length binary input aligned with the feature vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Vocabulary indices set to `1.0`, ascending.
    pub fn active_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Normalised-term → vocabulary-index lookup, built once per artifact.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    index: HashMap<String, usize>,
    width: usize,
}

impl FeatureEncoder {
    /// Build the lookup for `vocabulary`.
    ///
    /// When two entries normalise to the same key the later index wins.
    pub fn new(vocabulary: &TermTable) -> Self {
        let mut index = HashMap::with_capacity(vocabulary.len());
        for (i, term) in vocabulary.iter().enumerate() {
            if let Some(prev) = index.insert(normalize_term(term), i) {
                warn!(term, shadowed = prev, index = i, "vocabulary entries collide after normalisation");
            }
        }
        Self {
            index,
            width: vocabulary.len(),
        }
    }

    /// Vector length produced by [`encode`](Self::encode).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Vocabulary index for a raw term, if it is recognised.
    pub fn lookup(&self, term: &str) -> Option<usize> {
        self.index.get(&normalize_term(term)).copied()
    }

    /// Encode `symptoms`. Unrecognised terms are dropped; duplicates are
    /// idempotent; zero matches yield an all-zero vector.
    pub fn encode<S: AsRef<str>>(&self, symptoms: &[S]) -> FeatureVector {
        let mut vector = FeatureVector::zeros(self.width);
        let mut matched = 0usize;
        for symptom in symptoms {
            if let Some(i) = self.lookup(symptom.as_ref()) {
                vector.0[i] = 1.0;
                matched += 1;
            }
        }
        debug!(
            inputs = symptoms.len(),
            matched,
            active = vector.active_indices().len(),
            "encoded symptoms"
        );
        vector
    }
}
