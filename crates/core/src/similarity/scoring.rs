use std::collections::BTreeSet;

use thiserror::Error;

use super::WEIGHT_SUM_TOLERANCE;
use crate::canonical::canonicalize;
use super::CandidateScorer;
use crate::domain::{Perfume, Sex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub family: f64,
    /// Umbrella weight for the three note layers below.
    pub notes: f64,
    pub perfume_type: f64,
    pub upper_notes: f64,
    pub core_notes: f64,
    pub base_notes: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("weight `{name}` must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("{group} weights must sum to 1.0, got {sum}")]
    BadSum { group: &'static str, sum: f64 },
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in self.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(WeightError::OutOfRange { name, value });
            }
        }

        let top = self.family + self.notes + self.perfume_type;
        if (top - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { group: "family + notes + type", sum: top });
        }

        let layers = self.upper_notes + self.core_notes + self.base_notes;
        if (layers - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { group: "upper + core + base notes", sum: layers });
        }

        Ok(())
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("family", self.family),
            ("notes", self.notes),
            ("type", self.perfume_type),
            ("upper_notes", self.upper_notes),
            ("core_notes", self.core_notes),
            ("base_notes", self.base_notes),
        ]
    }
}

/// Canonicalized view of the attributes that take part in scoring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScentProfile {
    pub perfume_type: String,
    pub sex: Sex,
    pub family: BTreeSet<String>,
    pub upper_notes: BTreeSet<String>,
    pub core_notes: BTreeSet<String>,
    pub base_notes: BTreeSet<String>,
}

impl ScentProfile {
    pub fn of(perfume: &Perfume) -> Self {
        let properties = &perfume.properties;
        Self {
            perfume_type: canonicalize(&properties.perfume_type),
            sex: perfume.sex,
            family: canonical_set(&properties.family),
            upper_notes: canonical_set(&properties.upper_notes),
            core_notes: canonical_set(&properties.core_notes),
            base_notes: canonical_set(&properties.base_notes),
        }
    }
}

fn canonical_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| canonicalize(value))
        .filter(|value| !value.is_empty())
        .collect()
}

/// `|A ∩ B| / |A ∪ B|`, with two empty sets scoring 0.
pub fn jaccard(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
    let intersection = left.intersection(right).count();
    let union = left.len() + right.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
    exclude_opposite_sex: bool,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { weights: ScoringWeights::default(), exclude_opposite_sex: false }
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights, exclude_opposite_sex: false }
    }

    /// Male vs female pairs score zero when enabled.
    pub fn excluding_opposite_sex(mut self, enabled: bool) -> Self {
        self.exclude_opposite_sex = enabled;
        self
    }

    pub fn score(&self, reference: &ScentProfile, candidate: &ScentProfile) -> f64 {
        if self.exclude_opposite_sex && reference.sex.is_opposite(candidate.sex) {
            return 0.0;
        }

        let weights = &self.weights;
        let type_match = reference.perfume_type == candidate.perfume_type;
        let notes = weights.upper_notes * jaccard(&reference.upper_notes, &candidate.upper_notes)
            + weights.core_notes * jaccard(&reference.core_notes, &candidate.core_notes)
            + weights.base_notes * jaccard(&reference.base_notes, &candidate.base_notes);

        let total = weights.family * jaccard(&reference.family, &candidate.family)
            + weights.perfume_type * if type_match { 1.0 } else { 0.0 }
            + weights.notes * notes;

        total.clamp(0.0, 1.0)
    }

    /// Binds the calculator to one reference for pooled scoring.
    pub fn against(&self, reference: &Perfume) -> ReferenceScorer {
        ReferenceScorer { calculator: *self, reference: ScentProfile::of(reference) }
    }
}

/// Scores candidates against a fixed reference perfume.
#[derive(Clone, Debug)]
pub struct ReferenceScorer {
    calculator: ScoreCalculator,
    reference: ScentProfile,
}

impl CandidateScorer for ReferenceScorer {
    fn score(&self, candidate: &Perfume) -> f64 {
        self.calculator.score(&self.reference, &ScentProfile::of(candidate))
    }
}
