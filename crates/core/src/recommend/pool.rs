use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::Perfume;
use crate::errors::SuggestError;
use crate::similarity::CandidateScorer;

pub const DEFAULT_WORKERS: usize = 5;

/// One candidate score as it reached the collector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub index: usize,
    pub score: f64,
}

/// Bounded fan-out of CPU-bound scoring for a single request.
///
/// Workers pull the next unclaimed candidate from a shared cursor and push
/// results to one collector, so the output is in arrival order. All workers
/// are joined before [`ScoringPool::score`] returns.
#[derive(Clone, Copy, Debug)]
pub struct ScoringPool {
    workers: usize,
}

impl ScoringPool {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn score<S>(
        &self,
        scorer: Arc<S>,
        candidates: Arc<Vec<Perfume>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Scored>, SuggestError>
    where
        S: CandidateScorer + 'static,
    {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = Arc::new(AtomicUsize::new(0));
        let worker_count = self.workers.min(candidates.len());
        let (sender, mut receiver) = mpsc::channel::<Scored>(worker_count * 4);
        let mut workers = JoinSet::new();

        for _ in 0..worker_count {
            let scorer = Arc::clone(&scorer);
            let candidates = Arc::clone(&candidates);
            let cursor = Arc::clone(&cursor);
            let sender = sender.clone();
            let cancel = cancel.clone();

            workers.spawn_blocking(move || loop {
                if cancel.is_cancelled() {
                    break;
                }
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(candidate) = candidates.get(index) else {
                    break;
                };
                let score = scorer.score(candidate);
                if sender.blocking_send(Scored { index, score }).is_err() {
                    break;
                }
            });
        }
        drop(sender);

        let mut arrivals = Vec::with_capacity(candidates.len());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = receiver.recv() => match next {
                    Some(scored) => arrivals.push(scored),
                    None => break,
                },
            }
        }
        drop(receiver);

        let mut failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(error) = joined {
                failure.get_or_insert_with(|| format!("scoring worker failed: {error}"));
            }
        }

        if cancel.is_cancelled() {
            debug!(
                event_name = "suggest.scoring.cancelled",
                scored = arrivals.len(),
                total = candidates.len(),
                "scoring cancelled before completion"
            );
            return Err(SuggestError::Cancelled);
        }
        if let Some(message) = failure {
            return Err(SuggestError::Internal(message));
        }

        Ok(arrivals)
    }
}
