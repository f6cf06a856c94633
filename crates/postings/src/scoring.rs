//! Relevance scoring hooks.

use core::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::model::DocId;

/// Combination rules for weights and scores, one pair per node kind.
pub trait Scorer: Send + Sync {
    fn norm_all(&self, weights: &[f32]) -> f32;
    fn norm_or(&self, weights: &[f32]) -> f32;
    fn norm_not(&self, what: f32, _excluded: f32) -> f32 {
        what
    }
    fn score_all(&self, scores: &[f32]) -> f32;
    fn score_or(&self, scores: &[f32]) -> f32;
    fn score_not(&self, what: f32, _excluded: f32) -> f32 {
        what
    }
    /// Score of a leaf with `occurrences` hits in a document of `doc_len` units.
    fn score_term(&self, occurrences: u32, doc_len: usize) -> f32;
}

/// Sums for conjunctions, maxima for disjunctions, saturating term scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScorer;

impl Scorer for DefaultScorer {
    fn norm_all(&self, weights: &[f32]) -> f32 {
        weights.iter().sum()
    }

    fn norm_or(&self, weights: &[f32]) -> f32 {
        weights.iter().copied().fold(0.0, f32::max)
    }

    fn score_all(&self, scores: &[f32]) -> f32 {
        scores.iter().sum()
    }

    fn score_or(&self, scores: &[f32]) -> f32 {
        scores.iter().copied().fold(0.0, f32::max)
    }

    fn score_term(&self, occurrences: u32, _doc_len: usize) -> f32 {
        1.0 - 1.0 / (1.0 + occurrences as f32)
    }
}

const SCORE_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(16).unwrap();

/// Attached to the operand of a top-level full-text predicate.
pub struct ScoringInfo {
    pub scorer: Arc<dyn Scorer>,
    pub cache: LruCache<DocId, f32>,
}

impl ScoringInfo {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer, cache: LruCache::new(SCORE_CACHE_SIZE) }
    }

    pub fn fresh(&self) -> Self {
        Self::new(self.scorer.clone())
    }
}

impl fmt::Debug for ScoringInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringInfo").field("cached", &self.cache.len()).finish()
    }
}

/// `1 / norm`, or 1 when the norm is not positive.
pub(crate) fn inverse_norm(norm: f32) -> f32 {
    if norm > 0.0 { 1.0 / norm } else { 1.0 }
}
