//! Result types returned by the searcher: a scored hit per matching
//! document plus the occurrences (highlighted context fragments) within it.

use crate::core::types::DocId;

#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub line: u32,
    pub column: u32,
    /// Byte offsets of the match itself within the highlighted text.
    pub match_start: usize,
    pub match_end: usize,
    /// Byte offsets of the surrounding context window, which extends
    /// `context_radius` bytes on either side of the match (clamped to char
    /// boundaries and the text's own bounds).
    pub start: usize,
    pub end: usize,
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub segment_index: usize,
    pub doc_id: DocId,
    pub score: f32,
    pub occurrences: Vec<Occurrence>,
}

/// What `Searcher::search` returns: the top-scoring hits (bounded by the
/// caller's limit) alongside the total number of documents that matched,
/// which may be larger than `hits.len()`.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub hits: Vec<ScoredHit>,
    pub total_hits: usize,
}

/// Collects every candidate hit, then sorts once and truncates to the top
/// `k` by score -- the same top-k collector shape the teacher's searcher
/// uses for its result ranking, without the incremental heap a
/// streaming-scale searcher would need.
pub struct TopKCollector {
    k: usize,
    hits: Vec<ScoredHit>,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector { k, hits: Vec::with_capacity(k) }
    }

    pub fn offer(&mut self, hit: ScoredHit) {
        self.hits.push(hit);
    }

    pub fn into_sorted(mut self) -> Vec<ScoredHit> {
        self.hits
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        self.hits.truncate(self.k);
        self.hits
    }
}
