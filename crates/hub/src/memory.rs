use async_trait::async_trait;
use scently_core::canonical::canonicalize;
use scently_core::{
    CatalogBatch, CatalogError, CatalogFilter, CatalogSink, CatalogSource, Perfume,
    ProcessedState, Sex,
};
use tokio::sync::RwLock;

/// Catalog held in process memory. Filters compare canonical forms the same
/// way the hub does.
#[derive(Default)]
pub struct InMemoryCatalog {
    perfumes: RwLock<Vec<Perfume>>,
}

impl InMemoryCatalog {
    pub fn new(perfumes: Vec<Perfume>) -> Self {
        Self { perfumes: RwLock::new(perfumes) }
    }

    pub async fn len(&self) -> usize {
        self.perfumes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.perfumes.read().await.is_empty()
    }
}

fn matches(filter: &CatalogFilter, perfume: &Perfume) -> bool {
    let field_matches = |wanted: &Option<String>, actual: &str| match wanted.as_deref() {
        Some(wanted) if !wanted.is_empty() => canonicalize(wanted) == canonicalize(actual),
        _ => true,
    };
    let sex_matches = match filter.sex {
        Some(sex @ (Sex::Male | Sex::Female)) => perfume.sex == sex,
        _ => true,
    };
    field_matches(&filter.brand, &perfume.brand)
        && field_matches(&filter.name, &perfume.name)
        && sex_matches
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch(&self, filter: &CatalogFilter) -> Result<CatalogBatch, CatalogError> {
        let perfumes: Vec<Perfume> = self
            .perfumes
            .read()
            .await
            .iter()
            .filter(|perfume| matches(filter, perfume))
            .cloned()
            .collect();
        let state = ProcessedState { successful_count: perfumes.len() as u64, failed_count: 0 };
        Ok(CatalogBatch { perfumes, state })
    }
}

#[async_trait]
impl CatalogSink for InMemoryCatalog {
    async fn update(
        &self,
        perfumes: &[Perfume],
        hard: bool,
    ) -> Result<ProcessedState, CatalogError> {
        let mut stored = self.perfumes.write().await;
        if hard {
            stored.clear();
        }

        let mut state = ProcessedState::default();
        for perfume in perfumes {
            if perfume.brand.trim().is_empty() || perfume.name.trim().is_empty() {
                state.failed_count += 1;
                continue;
            }
            match stored.iter_mut().find(|existing| existing.same_as(perfume)) {
                Some(existing) => *existing = perfume.clone(),
                None => stored.push(perfume.clone()),
            }
            state.successful_count += 1;
        }
        Ok(state)
    }
}
