//! Paper ranking and bounded, optionally randomized selection.
//!
//! Ranking is a stable sort on `(has open-access PDF, citations, year)`, all
//! descending, so the search engine's relevance order breaks remaining ties.
//! Randomized selection samples uniformly from the top of the ranked list;
//! the size of that candidate pool grows with the diversity factor.

use rand::Rng;
use rand::seq::index;
use tracing::{debug, instrument};

use crate::paper::PaperMetadata;

/// Default number of papers selected per run.
pub const DEFAULT_MAX_PAPERS: usize = 3;

/// Largest accepted `max_papers`.
pub const MAX_PAPERS_UPPER_LIMIT: usize = 20;

/// Default diversity factor for randomized selection.
pub const DEFAULT_DIVERSITY_FACTOR: f64 = 0.3;

/// Options controlling [`select`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionOptions {
    /// Maximum number of papers to return.
    pub max_papers: usize,
    /// Sample from a candidate pool instead of taking the top of the ranking.
    pub randomize: bool,
    /// Pool breadth in `[0, 1]`; out-of-range values are clamped.
    pub diversity_factor: f64,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            max_papers: DEFAULT_MAX_PAPERS,
            randomize: false,
            diversity_factor: DEFAULT_DIVERSITY_FACTOR,
        }
    }
}

/// Orders papers by `(has PDF desc, citation count desc, year desc)`.
///
/// A missing year ranks like year 0. The sort is stable.
#[must_use]
pub fn rank(papers: &[PaperMetadata]) -> Vec<PaperMetadata> {
    let mut ranked = papers.to_vec();
    ranked.sort_by(|a, b| {
        b.has_open_access_pdf()
            .cmp(&a.has_open_access_pdf())
            .then_with(|| b.citation_count.cmp(&a.citation_count))
            .then_with(|| b.year.unwrap_or(0).cmp(&a.year.unwrap_or(0)))
    });
    ranked
}

/// Size of the ranked prefix randomized selection draws from.
///
/// `max(max_papers, round(len * (0.1 + 0.9 * diversity)))`, clamped to `len`.
/// Non-decreasing in `diversity_factor`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn candidate_pool_size(len: usize, max_papers: usize, diversity_factor: f64) -> usize {
    let diversity = clamp_diversity(diversity_factor);
    let scaled = (len as f64 * (0.1 + 0.9 * diversity)).round() as usize;
    scaled.max(max_papers).min(len)
}

/// Selects at most `options.max_papers` papers.
///
/// Deterministic mode returns the top of the ranking. Randomized mode draws
/// without replacement from the top [`candidate_pool_size`] ranked papers;
/// the drawn papers are returned in rank order.
#[instrument(skip(papers, rng), fields(candidates = papers.len()))]
pub fn select<R>(papers: &[PaperMetadata], options: &SelectionOptions, rng: &mut R) -> Vec<PaperMetadata>
where
    R: Rng + ?Sized,
{
    let mut ranked = rank(papers);
    let count = options.max_papers.min(ranked.len());
    if count == 0 {
        return Vec::new();
    }

    if !options.randomize {
        ranked.truncate(count);
        debug!(selected = count, "selected top-ranked papers");
        return ranked;
    }

    let pool = candidate_pool_size(ranked.len(), options.max_papers, options.diversity_factor);
    let mut picks = index::sample(rng, pool, count).into_vec();
    picks.sort_unstable();
    debug!(pool, selected = count, "sampled papers from candidate pool");

    picks.into_iter().map(|i| ranked[i].clone()).collect()
}

fn clamp_diversity(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
