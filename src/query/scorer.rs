//! BM25 relevance scoring.

use std::fmt::Debug;

/// Trait for term scorers.
pub trait Scorer: Send + Debug {
    /// Score one occurrence count in a field of the given length.
    fn score(&self, term_freq: f32, field_length: f32) -> f32;

    /// Get the boost factor for this scorer.
    fn boost(&self) -> f32;

    /// Get the maximum possible score.
    fn max_score(&self) -> f32;

    /// Get the name of this scorer.
    fn name(&self) -> &'static str;
}

/// Okapi BM25 with the usual `k1 = 1.2`, `b = 0.75`.
#[derive(Debug, Clone)]
pub struct BM25Scorer {
    /// Document frequency of the term.
    doc_freq: u64,
    /// Average field length.
    avg_field_length: f64,
    /// Total number of documents in the index.
    total_docs: u64,
    /// Boost factor.
    boost: f32,
    /// BM25 k1 parameter.
    k1: f32,
    /// BM25 b parameter.
    b: f32,
}

impl BM25Scorer {
    /// Create a new BM25 scorer.
    pub fn new(doc_freq: u64, avg_field_length: f64, total_docs: u64, boost: f32) -> Self {
        Self::with_params(doc_freq, avg_field_length, total_docs, boost, 1.2, 0.75)
    }

    /// Create a new BM25 scorer with custom parameters.
    pub fn with_params(
        doc_freq: u64,
        avg_field_length: f64,
        total_docs: u64,
        boost: f32,
        k1: f32,
        b: f32,
    ) -> Self {
        BM25Scorer {
            doc_freq,
            avg_field_length,
            total_docs,
            boost,
            k1,
            b,
        }
    }

    /// Inverse document frequency, `ln(1 + (N - df + 0.5) / (df + 0.5))`.
    ///
    /// Always positive, so a term present in every document still adds to the score.
    pub fn idf(&self) -> f32 {
        if self.doc_freq == 0 || self.total_docs == 0 {
            return 0.0;
        }

        let n = self.total_docs as f32;
        let df = self.doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn tf(&self, term_freq: f32, field_length: f32) -> f32 {
        if term_freq == 0.0 {
            return 0.0;
        }

        let avg_len = self.avg_field_length as f32;
        let norm = if avg_len > 0.0 {
            1.0 - self.b + self.b * (field_length / avg_len)
        } else {
            1.0
        };
        (term_freq * (self.k1 + 1.0)) / (term_freq + self.k1 * norm)
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f32 {
        self.k1
    }

    /// Get the b parameter.
    pub fn b(&self) -> f32 {
        self.b
    }
}

impl Scorer for BM25Scorer {
    fn score(&self, term_freq: f32, field_length: f32) -> f32 {
        self.boost * self.idf() * self.tf(term_freq, field_length)
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn max_score(&self) -> f32 {
        self.boost * self.idf() * (self.k1 + 1.0)
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bm25_scorer_creation() {
        let scorer = BM25Scorer::new(10, 50.0, 1000, 1.0);
        assert_eq!(scorer.k1(), 1.2);
        assert_eq!(scorer.b(), 0.75);
        assert_eq!(scorer.name(), "BM25");
    }

    #[test]
    fn test_rarer_terms_score_higher() {
        let rare = BM25Scorer::new(1, 10.0, 100, 1.0);
        let common = BM25Scorer::new(90, 10.0, 100, 1.0);
        assert!(rare.score(1.0, 10.0) > common.score(1.0, 10.0));
        assert!(common.score(1.0, 10.0) > 0.0);
    }

    #[test]
    fn test_boost_scales_linearly() {
        let plain = BM25Scorer::new(3, 10.0, 100, 1.0);
        let boosted = BM25Scorer::new(3, 10.0, 100, 0.5);
        let diff = plain.score(2.0, 8.0) * 0.5 - boosted.score(2.0, 8.0);
        assert!(diff.abs() < 1e-6);
    }

    #[test]
    fn test_shorter_fields_score_higher() {
        let scorer = BM25Scorer::new(3, 10.0, 100, 1.0);
        assert!(scorer.score(1.0, 5.0) > scorer.score(1.0, 20.0));
        assert!(scorer.score(1.0, 5.0) <= scorer.max_score());
    }

    #[test]
    fn test_unknown_term_scores_zero() {
        let scorer = BM25Scorer::new(0, 0.0, 0, 1.0);
        assert_eq!(scorer.score(1.0, 1.0), 0.0);
        assert_eq!(scorer.max_score(), 0.0);
    }
}
