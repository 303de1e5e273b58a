use std::cmp::Ordering;

use crate::domain::{Perfume, Ranked};

/// Keeps the `k` best-scoring candidates and assigns ranks `1..=len`.
///
/// Candidates must be supplied in arrival order: the sort is stable, so equal
/// scores keep that order. Excluding the reference is the caller's job.
pub fn select_top_k<'a>(
    scored: impl IntoIterator<Item = (&'a Perfume, f64)>,
    k: usize,
) -> Vec<Ranked> {
    let mut kept: Vec<(&Perfume, f64)> = scored.into_iter().collect();

    kept.sort_by(|left, right| descending(left.1, right.1));
    kept.truncate(k);

    kept.into_iter()
        .zip(1u32..)
        .map(|((perfume, score), rank)| Ranked { perfume: perfume.clone(), rank, score })
        .collect()
}

fn descending(left: f64, right: f64) -> Ordering {
    right.total_cmp(&left)
}
