use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pool::ScoringPool;
use super::singleflight::SingleFlight;
use crate::domain::{Fingerprint, GlueKey, Perfume, Ranked, SuggestRequest, TagRequest};
use crate::errors::SuggestError;
use crate::glue::glue;
use crate::ports::{Advisor, CatalogFilter, CatalogSource, ResponseCache};
use crate::similarity::{
    select_top_k, CandidateScorer, ScoreCalculator, TagScorer, TagWeights, DEFAULT_SUGGEST_COUNT,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecommenderSettings {
    pub workers: usize,
    pub suggest_count: usize,
    pub cache_ttl: Duration,
    pub tag_weights: TagWeights,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            workers: super::pool::DEFAULT_WORKERS,
            suggest_count: DEFAULT_SUGGEST_COUNT,
            cache_ttl: Duration::from_secs(3600),
            tag_weights: TagWeights::default(),
        }
    }
}

/// Cache-then-compute suggest flow.
///
/// Collaborators are injected once at startup; the recommender itself holds
/// no per-request state besides the in-flight map.
pub struct Recommender {
    catalog: Arc<dyn CatalogSource>,
    advisor: Option<Arc<dyn Advisor>>,
    cache: Arc<dyn ResponseCache>,
    calculator: ScoreCalculator,
    settings: RecommenderSettings,
    in_flight: SingleFlight<Fingerprint, Vec<Ranked>, SuggestError>,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        cache: Arc<dyn ResponseCache>,
        calculator: ScoreCalculator,
        settings: RecommenderSettings,
    ) -> Self {
        Self { catalog, advisor: None, cache, calculator, settings, in_flight: SingleFlight::new() }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend_name()
    }

    pub async fn suggest(
        &self,
        request: &SuggestRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ranked>, SuggestError> {
        let fingerprint = Fingerprint::from_request(request)?;

        let cache_healthy = match cancellable(cancel, self.cache.load(&fingerprint)).await? {
            Ok(Some(ranked)) => {
                debug!(
                    event_name = "suggest.cache.hit",
                    key = %fingerprint,
                    items = ranked.len(),
                    "serving cached suggestions"
                );
                return Ok(ranked);
            }
            Ok(None) => true,
            Err(error) => {
                warn!(
                    event_name = "suggest.cache.unavailable",
                    key = %fingerprint,
                    error = %error,
                    "cache load failed; computing without storing"
                );
                false
            }
        };

        loop {
            let flight = self.in_flight.run(fingerprint.clone(), || {
                self.compute(request, &fingerprint, cache_healthy, cancel)
            });
            let result = cancellable(cancel, flight).await?;

            // a leader cancelled by its own caller must not fail the waiters
            match result {
                Err(SuggestError::Cancelled) if !cancel.is_cancelled() => continue,
                other => return other,
            }
        }
    }

    async fn compute(
        &self,
        request: &SuggestRequest,
        fingerprint: &Fingerprint,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ranked>, SuggestError> {
        let started = Instant::now();
        let reference_filter = CatalogFilter::by_identity(&request.brand, &request.name);
        let universe_filter = CatalogFilter::all();

        let (reference_batch, universe_batch) = cancellable(cancel, async {
            tokio::try_join!(
                async { self.catalog.fetch(&reference_filter).await.map_err(SuggestError::from) },
                async { self.catalog.fetch(&universe_filter).await.map_err(SuggestError::from) },
            )
        })
        .await??;

        let reference = pick_reference(reference_batch.perfumes).ok_or_else(|| {
            SuggestError::NotFound { brand: request.brand.clone(), name: request.name.clone() }
        })?;

        let mut candidates = universe_batch.perfumes;
        if fingerprint.use_ai() {
            candidates = self.shortlist(&reference, candidates, cancel).await?;
        }

        let reference_identity = reference.identity();
        let candidates: Vec<Perfume> = glue(candidates)
            .into_iter()
            .filter(|candidate| candidate.identity() != reference_identity)
            .collect();
        let candidates = Arc::new(candidates);

        let scorer = Arc::new(self.calculator.against(&reference));
        let ranked = self.rank(scorer, Arc::clone(&candidates), 0.0, cancel).await?;

        if cancel.is_cancelled() {
            return Err(SuggestError::Cancelled);
        }

        if store {
            if let Err(error) =
                self.cache.store(fingerprint, &ranked, self.settings.cache_ttl).await
            {
                warn!(
                    event_name = "suggest.cache.store_failed",
                    key = %fingerprint,
                    error = %error,
                    "cache store failed; response still served"
                );
            }
        }

        info!(
            event_name = "suggest.computed",
            key = %fingerprint,
            candidates = candidates.len(),
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "suggestions computed"
        );
        Ok(ranked)
    }

    /// Ranks the catalog against a set of requested tags. Results are neither
    /// cached nor deduplicated.
    pub async fn suggest_by_tags(
        &self,
        request: &TagRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ranked>, SuggestError> {
        let started = Instant::now();
        let requested = request.weighted_tags()?;
        let filter = CatalogFilter { sex: request.sex_filter(), ..CatalogFilter::all() };

        let batch = cancellable(cancel, self.catalog.fetch(&filter)).await??;
        let candidates = Arc::new(glue(batch.perfumes));

        let scorer = Arc::new(TagScorer::new(requested, self.settings.tag_weights));
        // a perfume sharing no tag with the request is not a suggestion
        let ranked =
            self.rank(scorer, Arc::clone(&candidates), f64::MIN_POSITIVE, cancel).await?;

        info!(
            event_name = "suggest.tags.computed",
            tags = request.tags.len(),
            candidates = candidates.len(),
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tag suggestions computed"
        );
        Ok(ranked)
    }

    /// Pooled scoring followed by top-K over candidates scoring at least
    /// `min_score`.
    async fn rank<S>(
        &self,
        scorer: Arc<S>,
        candidates: Arc<Vec<Perfume>>,
        min_score: f64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ranked>, SuggestError>
    where
        S: CandidateScorer + 'static,
    {
        let pool = ScoringPool::new(self.settings.workers);
        let arrivals = pool.score(scorer, Arc::clone(&candidates), cancel).await?;
        let eligible = arrivals
            .iter()
            .filter(|scored| scored.score >= min_score)
            .map(|scored| (&candidates[scored.index], scored.score));
        Ok(select_top_k(eligible, self.settings.suggest_count))
    }

    /// Restricts candidates to the advisor's shortlist. Any advisor failure,
    /// or a shortlist that matches nothing in the catalog, keeps the full set.
    async fn shortlist(
        &self,
        reference: &Perfume,
        candidates: Vec<Perfume>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Perfume>, SuggestError> {
        let Some(advisor) = &self.advisor else {
            debug!(event_name = "suggest.advisor.disabled", "advisor not configured");
            return Ok(candidates);
        };

        let advised = match cancellable(cancel, advisor.advise(reference)).await? {
            Ok(advised) => advised,
            Err(error) => {
                warn!(
                    event_name = "suggest.advisor.degraded",
                    error = %error,
                    "advisor failed; using the full catalog"
                );
                return Ok(candidates);
            }
        };

        let wanted: HashSet<GlueKey> =
            advised.iter().map(|entry| GlueKey::new(&entry.brand, &entry.name)).collect();
        let (kept, rest): (Vec<Perfume>, Vec<Perfume>) =
            candidates.into_iter().partition(|candidate| wanted.contains(&candidate.glue_key()));

        if kept.is_empty() {
            warn!(
                event_name = "suggest.advisor.degraded",
                advised = advised.len(),
                "advisor shortlist matched no catalog entry; using the full catalog"
            );
            return Ok(rest);
        }

        debug!(
            event_name = "suggest.advisor.shortlisted",
            advised = advised.len(),
            kept = kept.len(),
            "advisor shortlist applied"
        );
        Ok(kept)
    }
}

/// Picks the smallest canonical identity so repeated rows resolve the same way
/// on every request.
fn pick_reference(perfumes: Vec<Perfume>) -> Option<Perfume> {
    perfumes.into_iter().min_by_key(|perfume| perfume.identity())
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = T>,
) -> Result<T, SuggestError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SuggestError::Cancelled),
        output = work => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::{Recommender, RecommenderSettings};
    use crate::canonical::canonicalize;
    use crate::domain::{
        EnrichedNote, Fingerprint, Perfume, Properties, Ranked, Sex, ShopInfo, SuggestRequest,
        TagRequest, Variant,
    };
    use crate::errors::{ErrorKind, SuggestError};
    use crate::ports::{
        AdvisedPerfume, Advisor, AdvisorError, CacheError, CatalogBatch, CatalogError,
        CatalogFilter, CatalogSource, ResponseCache,
    };
    use crate::similarity::ScoreCalculator;

    struct StubCatalog {
        perfumes: Vec<Perfume>,
        fetches: AtomicUsize,
        delay: Duration,
        failure: Option<CatalogError>,
    }

    impl StubCatalog {
        fn new(perfumes: Vec<Perfume>) -> Self {
            Self { perfumes, fetches: AtomicUsize::new(0), delay: Duration::ZERO, failure: None }
        }

        fn universe_fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for StubCatalog {
        async fn fetch(&self, filter: &CatalogFilter) -> Result<CatalogBatch, CatalogError> {
            if filter.is_empty() {
                self.fetches.fetch_add(1, Ordering::SeqCst);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            let matches = |perfume: &Perfume| {
                let brand = filter.brand.as_deref().map(canonicalize);
                let name = filter.name.as_deref().map(canonicalize);
                brand.map_or(true, |brand| canonicalize(&perfume.brand) == brand)
                    && name.map_or(true, |name| canonicalize(&perfume.name) == name)
                    && filter.sex.map_or(true, |sex| perfume.sex == sex)
            };
            let perfumes: Vec<Perfume> =
                self.perfumes.iter().filter(|perfume| matches(perfume)).cloned().collect();
            Ok(CatalogBatch { perfumes, ..CatalogBatch::default() })
        }
    }

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, Vec<Ranked>>>,
        broken: bool,
        stores: AtomicUsize,
    }

    #[async_trait]
    impl ResponseCache for MapCache {
        async fn load(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<Ranked>>, CacheError> {
            if self.broken {
                return Err(CacheError::Connection("connection refused".to_string()));
            }
            let entries = self.entries.lock().map_err(|_| CacheError::Command("poisoned".into()))?;
            Ok(entries.get(&fingerprint.cache_key()).cloned())
        }

        async fn store(
            &self,
            fingerprint: &Fingerprint,
            ranked: &[Ranked],
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            self.stores.fetch_add(1, Ordering::SeqCst);
            let mut entries =
                self.entries.lock().map_err(|_| CacheError::Command("poisoned".into()))?;
            entries.insert(fingerprint.cache_key(), ranked.to_vec());
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "map"
        }
    }

    struct StubAdvisor(Result<Vec<AdvisedPerfume>, AdvisorError>);

    #[async_trait]
    impl Advisor for StubAdvisor {
        async fn advise(&self, _reference: &Perfume) -> Result<Vec<AdvisedPerfume>, AdvisorError> {
            self.0.clone()
        }
    }

    fn perfume(brand: &str, name: &str, sex: Sex, family: &[&str], core: &[&str]) -> Perfume {
        let owned = |values: &[&str]| -> Vec<String> {
            values.iter().map(|value| value.to_string()).collect()
        };
        Perfume {
            brand: brand.to_string(),
            name: name.to_string(),
            sex,
            properties: Properties {
                perfume_type: "edp".to_string(),
                family: owned(family),
                core_notes: owned(core),
                ..Properties::default()
            },
            ..Perfume::default()
        }
    }

    fn ten_candidates() -> Vec<Perfume> {
        let mut catalog = vec![perfume("Chanel", "N°5", Sex::Female, &["floral"], &["rose"])];
        for index in 0..10 {
            let family = if index < 4 { "floral" } else { "woody" };
            catalog.push(perfume("House", &format!("Scent {index}"), Sex::Unisex, &[family], &[]));
        }
        catalog
    }

    fn recommender(catalog: Arc<StubCatalog>, cache: Arc<MapCache>) -> Recommender {
        Recommender::new(catalog, cache, ScoreCalculator::new(), RecommenderSettings::default())
    }

    #[tokio::test]
    async fn exact_match_is_excluded_from_results() {
        let catalog = Arc::new(StubCatalog::new(vec![
            perfume("Chanel", "N°5", Sex::Female, &["floral"], &["rose"]),
            perfume("Dior", "Sauvage", Sex::Male, &["fresh"], &["pepper"]),
        ]));
        let recommender = recommender(catalog, Arc::new(MapCache::default()));

        let ranked = recommender
            .suggest(&SuggestRequest::new("Chanel", "N°5"), &CancellationToken::new())
            .await
            .expect("suggest should succeed");

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.name, "Sauvage");
        assert_eq!(ranked[0].rank, 1);
    }

    #[tokio::test]
    async fn advisor_failure_degrades_to_the_full_catalog() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let recommender = recommender(catalog, Arc::new(MapCache::default()))
            .with_advisor(Arc::new(StubAdvisor(Err(AdvisorError::Status(503)))));

        let request = SuggestRequest::new("Chanel", "N°5").with_ai(true);
        let ranked = recommender
            .suggest(&request, &CancellationToken::new())
            .await
            .expect("advisor failure must not fail the request");

        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|entry| entry.perfume.properties.family == ["floral"]));
        let ranks: Vec<_> = ranked.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn advisor_shortlist_restricts_candidates() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let shortlist = vec![
            AdvisedPerfume { brand: "house".to_string(), name: "Scent 7".to_string(), sex: None },
            AdvisedPerfume { brand: "Nobody".to_string(), name: "Nothing".to_string(), sex: None },
        ];
        let recommender = recommender(catalog, Arc::new(MapCache::default()))
            .with_advisor(Arc::new(StubAdvisor(Ok(shortlist))));

        let request = SuggestRequest::new("Chanel", "N°5").with_ai(true);
        let ranked = recommender
            .suggest(&request, &CancellationToken::new())
            .await
            .expect("suggest should succeed");

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.name, "Scent 7");
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let cache = Arc::new(MapCache::default());
        let recommender = recommender(Arc::clone(&catalog), Arc::clone(&cache));
        let request = SuggestRequest::new("Chanel", "N°5");

        let first = recommender.suggest(&request, &CancellationToken::new()).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = recommender
            .suggest(&SuggestRequest::new(" chanel ", "n5"), &CancellationToken::new())
            .await;

        assert_eq!(first, second);
        assert_eq!(catalog.universe_fetches(), 1);
        assert_eq!(cache.stores.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_compute_once() {
        let mut stub = StubCatalog::new(ten_candidates());
        stub.delay = Duration::from_millis(50);
        let catalog = Arc::new(stub);
        let recommender =
            Arc::new(recommender(Arc::clone(&catalog), Arc::new(MapCache::default())));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let recommender = Arc::clone(&recommender);
            handles.push(tokio::spawn(async move {
                recommender
                    .suggest(&SuggestRequest::new("Chanel", "N°5"), &CancellationToken::new())
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("task joins").expect("suggest succeeds"));
        }
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(catalog.universe_fetches(), 1);
    }

    #[tokio::test]
    async fn broken_cache_is_treated_as_a_miss_without_store() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let cache = Arc::new(MapCache { broken: true, ..MapCache::default() });
        let recommender = recommender(catalog, Arc::clone(&cache));

        let ranked = recommender
            .suggest(&SuggestRequest::new("Chanel", "N°5"), &CancellationToken::new())
            .await
            .expect("cache failure must not fail the request");

        assert_eq!(ranked.len(), 4);
        assert_eq!(cache.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_reference_is_not_found() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let recommender = recommender(catalog, Arc::new(MapCache::default()));

        let error = recommender
            .suggest(&SuggestRequest::new("Guerlain", "Shalimar"), &CancellationToken::new())
            .await
            .expect_err("unknown reference should fail");

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn empty_brand_is_rejected_before_any_fetch() {
        let catalog = Arc::new(StubCatalog::new(ten_candidates()));
        let recommender = recommender(Arc::clone(&catalog), Arc::new(MapCache::default()));

        let error = recommender
            .suggest(&SuggestRequest::new("", "N°5"), &CancellationToken::new())
            .await
            .expect_err("empty brand should fail");

        assert_eq!(error, SuggestError::Validation("brand is empty".to_string()));
        assert_eq!(catalog.universe_fetches(), 0);
    }

    #[tokio::test]
    async fn catalog_timeout_is_upstream_unavailable() {
        let mut stub = StubCatalog::new(Vec::new());
        stub.failure = Some(CatalogError::Timeout(Duration::from_secs(2)));
        let recommender = recommender(Arc::new(stub), Arc::new(MapCache::default()));

        let error = recommender
            .suggest(&SuggestRequest::new("Chanel", "N°5"), &CancellationToken::new())
            .await
            .expect_err("catalog failure should surface");

        assert_eq!(error.kind().status_code(), 502);
    }

    #[tokio::test]
    async fn cancelled_request_stores_nothing() {
        let mut stub = StubCatalog::new(ten_candidates());
        stub.delay = Duration::from_secs(5);
        let cache = Arc::new(MapCache::default());
        let recommender = recommender(Arc::new(stub), Arc::clone(&cache));
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };
        let result = recommender.suggest(&SuggestRequest::new("Chanel", "N°5"), &cancel).await;
        canceller.await.expect("canceller joins");

        assert_eq!(result, Err(SuggestError::Cancelled));
        assert_eq!(cache.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_rows_are_glued_before_scoring() {
        let shop = |name: &str, volume: i32| ShopInfo {
            shop_name: name.to_string(),
            domain: format!("{name}.example"),
            image_url: String::new(),
            variants: vec![Variant { volume, price: volume * 2, link: String::new() }],
        };
        let mut first = perfume("Dior", "Sauvage", Sex::Male, &["fresh"], &["pepper"]);
        first.shops = vec![shop("gold", 50)];
        let mut second = first.clone();
        second.shops = vec![shop("letual", 100)];
        let catalog = Arc::new(StubCatalog::new(vec![
            perfume("Chanel", "N°5", Sex::Female, &["floral"], &["rose"]),
            first,
            second,
        ]));
        let recommender = recommender(catalog, Arc::new(MapCache::default()));

        let ranked = recommender
            .suggest(&SuggestRequest::new("Chanel", "N°5"), &CancellationToken::new())
            .await
            .expect("suggest should succeed");

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.shops.len(), 2);
    }

    fn tagged(name: &str, sex: Sex, core_tags: &[&str], base_tags: &[&str]) -> Perfume {
        let note = |tags: &[&str]| EnrichedNote {
            name: "note".to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        };
        let mut perfume = perfume("Tagged", name, sex, &[], &[]);
        perfume.properties.enriched_core_notes = vec![note(core_tags)];
        perfume.properties.enriched_base_notes = vec![note(base_tags)];
        perfume
    }

    fn tagged_catalog() -> Vec<Perfume> {
        vec![
            tagged("Amber Base", Sex::Female, &["citrus"], &["warm"]),
            tagged("Warm Heart", Sex::Male, &["warm"], &["citrus"]),
            tagged("Pure Warm", Sex::Male, &["warm"], &["warm"]),
            tagged("Green", Sex::Male, &["green"], &["fresh"]),
        ]
    }

    #[tokio::test]
    async fn tags_rank_the_catalog_and_drop_unrelated_perfumes() {
        let catalog = Arc::new(StubCatalog::new(tagged_catalog()));
        let recommender = recommender(catalog, Arc::new(MapCache::default()));

        let ranked = recommender
            .suggest_by_tags(&TagRequest::from_csv("Warm"), &CancellationToken::new())
            .await
            .expect("tag suggest should succeed");

        let names: Vec<_> = ranked.iter().map(|entry| entry.perfume.name.as_str()).collect();
        assert_eq!(names, ["Pure Warm", "Amber Base", "Warm Heart"]);
        let ranks: Vec<_> = ranked.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn tags_honour_the_requested_sex() {
        let catalog = Arc::new(StubCatalog::new(tagged_catalog()));
        let recommender = recommender(catalog, Arc::new(MapCache::default()));

        let ranked = recommender
            .suggest_by_tags(
                &TagRequest::new(["warm"]).with_sex(Some(Sex::Female)),
                &CancellationToken::new(),
            )
            .await
            .expect("tag suggest should succeed");

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.name, "Amber Base");
    }

    #[tokio::test]
    async fn blank_tags_are_rejected_before_any_fetch() {
        let catalog = Arc::new(StubCatalog::new(tagged_catalog()));
        let recommender = recommender(Arc::clone(&catalog), Arc::new(MapCache::default()));

        let error = recommender
            .suggest_by_tags(&TagRequest::from_csv(" , "), &CancellationToken::new())
            .await
            .expect_err("blank tags should fail");

        assert_eq!(error, SuggestError::Validation("tags are empty".to_string()));
        assert_eq!(catalog.universe_fetches(), 0);
    }
}
