//! Collector implementations for gathering search results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::index::segment::DocId;
use crate::query::SearchHit;

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Collect a document hit.
    fn collect(&mut self, doc_id: DocId, score: f32);

    /// Get the final results, best first.
    fn results(&self) -> Vec<SearchHit>;

    /// Get the total number of hits collected.
    fn total_hits(&self) -> u64;
}

/// A collector that keeps the top N documents by score.
///
/// Hits are ranked by descending score; equal scores keep index order (lower doc
/// id first).
#[derive(Debug)]
pub struct TopDocsCollector {
    /// Maximum number of documents to collect.
    max_docs: usize,
    /// Collected hits; the heap top is the worst kept hit.
    hits: BinaryHeap<ScoredDoc>,
    /// Total number of documents seen.
    total_hits: u64,
}

#[derive(Debug, Clone, Copy)]
struct ScoredDoc {
    doc_id: DocId,
    score: f32,
}

impl ScoredDoc {
    /// Ranking order: `Less` means `self` ranks before `other`.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    // Worse hits compare greater so the max-heap exposes the worst one.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            hits: BinaryHeap::with_capacity(max_docs.min(1024)),
            total_hits: 0,
        }
    }

    /// Get the maximum number of documents to collect.
    pub fn max_docs(&self) -> usize {
        self.max_docs
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, doc_id: DocId, score: f32) {
        self.total_hits += 1;
        if self.max_docs == 0 {
            return;
        }

        let scored = ScoredDoc { doc_id, score };
        if self.hits.len() < self.max_docs {
            self.hits.push(scored);
        } else if let Some(worst) = self.hits.peek() {
            if scored.rank(worst) == Ordering::Less {
                self.hits.pop();
                self.hits.push(scored);
            }
        }
    }

    fn results(&self) -> Vec<SearchHit> {
        let mut docs: Vec<ScoredDoc> = self.hits.iter().copied().collect();
        docs.sort_by(ScoredDoc::rank);
        docs.into_iter()
            .map(|doc| SearchHit {
                doc_id: doc.doc_id,
                score: doc.score,
                document: None,
            })
            .collect()
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(hits: &[SearchHit]) -> Vec<DocId> {
        hits.iter().map(|h| h.doc_id).collect()
    }

    #[test]
    fn test_keeps_top_n_by_score() {
        let mut collector = TopDocsCollector::new(3);
        for (doc, score) in [(0, 0.5), (1, 2.0), (2, 0.1), (3, 1.5), (4, 3.0)] {
            collector.collect(doc, score);
        }

        let results = collector.results();
        assert_eq!(ids(&results), vec![4, 1, 3]);
        assert_eq!(collector.total_hits(), 5);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_index_order() {
        let mut collector = TopDocsCollector::new(2);
        for doc in [5, 1, 3, 0] {
            collector.collect(doc, 1.0);
        }
        assert_eq!(ids(&collector.results()), vec![0, 1]);
    }

    #[test]
    fn test_zero_limit_still_counts() {
        let mut collector = TopDocsCollector::new(0);
        collector.collect(0, 1.0);
        collector.collect(1, 2.0);
        assert!(collector.results().is_empty());
        assert_eq!(collector.total_hits(), 2);
    }

    #[test]
    fn test_fewer_hits_than_limit() {
        let mut collector = TopDocsCollector::new(20);
        collector.collect(2, 0.3);
        collector.collect(7, 0.9);
        assert_eq!(ids(&collector.results()), vec![7, 2]);
        assert_eq!(collector.max_docs(), 20);
    }
}
