//! Request-level orchestration: cache lookup, singleflight, catalog fetch,
//! advisor shortlist, gluing, pooled scoring and top-K.

mod pipeline;
mod pool;
mod singleflight;

pub use pipeline::{Recommender, RecommenderSettings};
pub use pool::{Scored, ScoringPool, DEFAULT_WORKERS};
pub use singleflight::SingleFlight;
