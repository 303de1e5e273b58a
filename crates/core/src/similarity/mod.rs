//! Deterministic weighted set-similarity between perfumes.
//!
//! A score is a weighted sum of Jaccard indices over family and the three
//! note layers plus an exact type match. The engine is pure: no I/O and no
//! failure path. Missing sets are empty.
//!
//! Tag-based scoring compares a caller's requested tags with the tags of a
//! perfume's enriched notes by cosine similarity.

mod ranking;
mod scoring;
mod tags;

use crate::domain::Perfume;

pub use ranking::select_top_k;
pub use scoring::{
    jaccard, ReferenceScorer, ScentProfile, ScoreCalculator, ScoringWeights, WeightError,
};
pub use tags::{cosine, tag_vector, TagScorer, TagWeights};

/// Anything the scoring pool can fan out: a pure, thread-safe score in
/// `[0, 1]` for one candidate.
pub trait CandidateScorer: Send + Sync {
    fn score(&self, candidate: &Perfume) -> f64;
}

pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    family: 0.40,
    notes: 0.55,
    perfume_type: 0.05,
    upper_notes: 0.15,
    core_notes: 0.45,
    base_notes: 0.40,
};

pub const DEFAULT_TAG_WEIGHTS: TagWeights =
    TagWeights { upper_notes: 0.20, core_notes: 0.35, base_notes: 0.45 };

/// Number of ranked suggestions returned when nothing else is configured.
pub const DEFAULT_SUGGEST_COUNT: usize = 4;

/// Tolerance for the two weight identities.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
