//! Traits the recommendation pipeline consumes. Implementations live in
//! `scently-hub` (catalog, advisor) and `scently-cache` (response cache).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Fingerprint, Perfume, Ranked, Sex};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub sex: Option<Sex>,
}

impl CatalogFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_identity(brand: impl Into<String>, name: impl Into<String>) -> Self {
        Self { brand: Some(brand.into()), name: Some(name.into()), sex: None }
    }

    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.name.is_none() && self.sex.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedState {
    #[serde(default)]
    pub successful_count: u64,
    #[serde(default)]
    pub failed_count: u64,
}

impl ProcessedState {
    pub fn absorb(&mut self, other: ProcessedState) {
        self.successful_count += other.successful_count;
        self.failed_count += other.failed_count;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogBatch {
    #[serde(default)]
    pub perfumes: Vec<Perfume>,
    #[serde(default)]
    pub state: ProcessedState,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
    #[error("catalog transport failure: {0}")]
    Transport(String),
    #[error("catalog rejected credentials with status {0}")]
    Unauthorized(u16),
    #[error("catalog answered with unexpected status {0}")]
    Status(u16),
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_) | Self::Status(_))
    }
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, filter: &CatalogFilter) -> Result<CatalogBatch, CatalogError>;
}

/// Privileged bulk write path. `hard` replaces the catalog, otherwise the
/// records are merged into it.
#[async_trait]
pub trait CatalogSink: Send + Sync {
    async fn update(&self, perfumes: &[Perfume], hard: bool)
        -> Result<ProcessedState, CatalogError>;
}

/// One shortlist entry. Sex is optional because advisors often omit it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisedPerfume {
    pub brand: String,
    pub name: String,
    #[serde(default)]
    pub sex: Option<Sex>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("advisor timed out after {0:?}")]
    Timeout(Duration),
    #[error("advisor transport failure: {0}")]
    Transport(String),
    #[error("advisor answered with status {0}")]
    Status(u16),
    #[error("advisor response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, reference: &Perfume) -> Result<Vec<AdvisedPerfume>, AdvisorError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache connection failure: {0}")]
    Connection(String),
    #[error("cache command failed: {0}")]
    Command(String),
    #[error("cache payload codec failure: {0}")]
    Codec(String),
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// `Ok(None)` is a miss; `Err` means the backend itself is unhealthy.
    async fn load(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<Ranked>>, CacheError>;

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        ranked: &[Ranked],
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}
