//! HTTP client for the perfume hub: filtered reads, paged full scans and the
//! privileged bulk update.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scently_core::config::CatalogConfig;
use scently_core::{
    CatalogBatch, CatalogError, CatalogFilter, CatalogSink, CatalogSource, Perfume,
    ProcessedState, Sex,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HttpCatalog {
    client: Client,
    url: String,
    token: SecretString,
    timeout: Duration,
    page_concurrency: usize,
    max_pages: u32,
}

impl HttpCatalog {
    pub fn new(client: Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            url: config.get_perfumes_url.clone(),
            token: config.internal_token.clone(),
            timeout: config.timeout(),
            page_concurrency: config.page_concurrency.max(1),
            max_pages: config.max_pages.max(1),
        }
    }

    /// One request. `Ok(None)` means the hub answered 404.
    async fn fetch_page(
        &self,
        filter: &CatalogFilter,
        page: Option<u32>,
    ) -> Result<Option<CatalogBatch>, CatalogError> {
        let response = self
            .client
            .get(&self.url)
            .query(&query_pairs(filter, page))
            .bearer_auth(self.token.expose_secret())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| request_error(error, self.timeout))?;

        match response.status() {
            StatusCode::OK => {
                let batch = response
                    .json::<CatalogBatch>()
                    .await
                    .map_err(|error| body_error(error, self.timeout))?;
                Ok(Some(batch))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(CatalogError::Unauthorized(status.as_u16()))
            }
            status => Err(CatalogError::Status(status.as_u16())),
        }
    }

    /// Walks `page=1,2,...` with a fixed number of concurrent fetchers that
    /// share one page counter. The first empty or missing page ends the scan;
    /// pages are reassembled in page order.
    async fn fetch_all_pages(&self, filter: &CatalogFilter) -> Result<CatalogBatch, CatalogError> {
        let next_page = Arc::new(AtomicU32::new(1));
        let end_page = Arc::new(AtomicU32::new(u32::MAX));
        let mut fetchers = JoinSet::new();

        for _ in 0..self.page_concurrency {
            let catalog = self.clone();
            let filter = filter.clone();
            let next_page = Arc::clone(&next_page);
            let end_page = Arc::clone(&end_page);

            fetchers.spawn(async move {
                let mut pages = Vec::new();
                loop {
                    let page = next_page.fetch_add(1, Ordering::SeqCst);
                    if page > catalog.max_pages || page >= end_page.load(Ordering::SeqCst) {
                        break;
                    }
                    match catalog.fetch_page(&filter, Some(page)).await? {
                        Some(batch) if !batch.perfumes.is_empty() => pages.push((page, batch)),
                        _ => {
                            end_page.fetch_min(page, Ordering::SeqCst);
                            break;
                        }
                    }
                }
                Ok::<_, CatalogError>(pages)
            });
        }

        let mut collected = BTreeMap::new();
        let mut failure = None;
        while let Some(joined) = fetchers.join_next().await {
            match joined {
                Ok(Ok(pages)) => collected.extend(pages),
                Ok(Err(error)) => {
                    failure.get_or_insert(error);
                    fetchers.abort_all();
                }
                Err(error) if error.is_cancelled() => {}
                Err(error) => {
                    failure.get_or_insert(CatalogError::Transport(format!(
                        "page fetcher failed: {error}"
                    )));
                }
            }
        }
        if let Some(error) = failure {
            return Err(error);
        }

        let end = end_page.load(Ordering::SeqCst);
        if end == u32::MAX {
            warn!(
                event_name = "catalog.scan.truncated",
                max_pages = self.max_pages,
                "catalog scan stopped at the page limit"
            );
        }

        let mut merged = CatalogBatch::default();
        let mut page_count = 0usize;
        for (_, batch) in collected.into_iter().take_while(|(page, _)| *page < end) {
            page_count += 1;
            merged.perfumes.extend(batch.perfumes);
            merged.state.absorb(batch.state);
        }

        debug!(
            event_name = "catalog.scan.completed",
            pages = page_count,
            perfumes = merged.perfumes.len(),
            "catalog scan completed"
        );
        Ok(merged)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self, filter: &CatalogFilter) -> Result<CatalogBatch, CatalogError> {
        if filter.brand.is_none() && filter.name.is_none() {
            return self.fetch_all_pages(filter).await;
        }
        Ok(self.fetch_page(filter, None).await?.unwrap_or_default())
    }
}

/// Bulk writer for `POST {update_perfumes_url}?is_hard=`.
#[derive(Clone)]
pub struct HttpCatalogSink {
    client: Client,
    url: String,
    token: SecretString,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    perfumes: &'a [Perfume],
}

#[derive(Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    state: ProcessedState,
}

impl HttpCatalogSink {
    pub fn new(client: Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            url: config.update_perfumes_url.clone(),
            token: config.internal_token.clone(),
        }
    }
}

#[async_trait]
impl CatalogSink for HttpCatalogSink {
    async fn update(
        &self,
        perfumes: &[Perfume],
        hard: bool,
    ) -> Result<ProcessedState, CatalogError> {
        if perfumes.is_empty() {
            return Ok(ProcessedState::default());
        }

        let response = self
            .client
            .post(&self.url)
            .query(&[("is_hard", hard)])
            .bearer_auth(self.token.expose_secret())
            .json(&UpdateRequest { perfumes })
            .send()
            .await
            .map_err(|error| request_error(error, Duration::ZERO))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<UpdateResponse>()
                    .await
                    .map_err(|error| body_error(error, Duration::ZERO))?;
                Ok(body.state)
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(CatalogError::Unauthorized(status.as_u16()))
            }
            status => Err(CatalogError::Status(status.as_u16())),
        }
    }
}

fn query_pairs(filter: &CatalogFilter, page: Option<u32>) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::with_capacity(4);
    if let Some(brand) = filter.brand.as_deref().filter(|brand| !brand.is_empty()) {
        pairs.push(("brand", brand.to_string()));
    }
    if let Some(name) = filter.name.as_deref().filter(|name| !name.is_empty()) {
        pairs.push(("name", name.to_string()));
    }
    if let Some(sex @ (Sex::Male | Sex::Female)) = filter.sex {
        pairs.push(("sex", sex.as_str().to_string()));
    }
    if let Some(page) = page {
        pairs.push(("page", page.to_string()));
    }
    pairs
}

fn request_error(error: reqwest::Error, timeout: Duration) -> CatalogError {
    if error.is_timeout() {
        CatalogError::Timeout(timeout)
    } else {
        CatalogError::Transport(error.to_string())
    }
}

fn body_error(error: reqwest::Error, timeout: Duration) -> CatalogError {
    if error.is_timeout() {
        CatalogError::Timeout(timeout)
    } else if error.is_decode() {
        CatalogError::Decode(error.to_string())
    } else {
        CatalogError::Transport(error.to_string())
    }
}
