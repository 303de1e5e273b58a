use std::collections::BTreeMap;

use super::{CandidateScorer, WeightError, WEIGHT_SUM_TOLERANCE};
use crate::canonical::canonicalize;
use crate::domain::{EnrichedNote, Perfume};

/// Per-layer weights for tag vectors. Base notes linger longest, so they
/// dominate by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagWeights {
    pub upper_notes: f64,
    pub core_notes: f64,
    pub base_notes: f64,
}

impl Default for TagWeights {
    fn default() -> Self {
        super::DEFAULT_TAG_WEIGHTS
    }
}

impl TagWeights {
    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in [
            ("tag_upper_notes", self.upper_notes),
            ("tag_core_notes", self.core_notes),
            ("tag_base_notes", self.base_notes),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(WeightError::OutOfRange { name, value });
            }
        }

        let sum = self.upper_notes + self.core_notes + self.base_notes;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { group: "tag upper + core + base notes", sum });
        }
        Ok(())
    }
}

/// Weighted tag vector of one perfume: each tag counts once per note that
/// carries it, scaled by that note's layer weight.
pub fn tag_vector(perfume: &Perfume, weights: &TagWeights) -> BTreeMap<String, f64> {
    let properties = &perfume.properties;
    let mut vector = BTreeMap::new();
    for (notes, weight) in [
        (&properties.enriched_upper_notes, weights.upper_notes),
        (&properties.enriched_core_notes, weights.core_notes),
        (&properties.enriched_base_notes, weights.base_notes),
    ] {
        accumulate(&mut vector, notes, weight);
    }
    vector
}

fn accumulate(vector: &mut BTreeMap<String, f64>, notes: &[EnrichedNote], weight: f64) {
    for tag in notes.iter().flat_map(|note| note.tags.iter()) {
        let tag = canonicalize(tag);
        if !tag.is_empty() {
            *vector.entry(tag).or_insert(0.0) += weight;
        }
    }
}

/// Cosine of the angle between two sparse vectors; 0 when either is zero.
pub fn cosine(left: &BTreeMap<String, f64>, right: &BTreeMap<String, f64>) -> f64 {
    let dot: f64 = left
        .iter()
        .filter_map(|(tag, value)| right.get(tag).map(|other| value * other))
        .sum();
    let left_norm = left.values().map(|value| value * value).sum::<f64>().sqrt();
    let right_norm = right.values().map(|value| value * value).sum::<f64>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    (dot / (left_norm * right_norm)).clamp(0.0, 1.0)
}

/// Scores candidates against a caller's requested tags.
#[derive(Clone, Debug)]
pub struct TagScorer {
    requested: BTreeMap<String, f64>,
    weights: TagWeights,
}

impl TagScorer {
    pub fn new(requested: BTreeMap<String, f64>, weights: TagWeights) -> Self {
        Self { requested, weights }
    }
}

impl CandidateScorer for TagScorer {
    fn score(&self, candidate: &Perfume) -> f64 {
        cosine(&self.requested, &tag_vector(candidate, &self.weights))
    }
}
