pub mod canonical;
pub mod config;
pub mod domain;
pub mod errors;
pub mod glue;
pub mod ports;
pub mod recommend;
pub mod similarity;

pub use canonical::canonicalize;
pub use domain::{
    EnrichedNote, Fingerprint, GlueKey, Perfume, PerfumeIdentity, Properties, Ranked, Sex,
    ShopInfo, SuggestRequest, TagRequest, Variant,
};
pub use errors::{ErrorKind, SuggestError};
pub use glue::glue;
pub use ports::{
    AdvisedPerfume, Advisor, AdvisorError, CacheError, CatalogBatch, CatalogError, CatalogFilter,
    CatalogSink, CatalogSource, ProcessedState, ResponseCache,
};
pub use recommend::{Recommender, RecommenderSettings, SingleFlight};
pub use similarity::{ScoreCalculator, ScoringWeights, TagWeights};
