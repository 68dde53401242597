//! Construction of the weighted disjunction searched for an augmented query.
//!
//! Every keyword contributes a clause at weight 1.0. Its synonyms follow at 0.8,
//! 0.7, ... in rank order, never dropping below 0.1:
//!
//! | synonym rank | 0   | 1   | 2   | ... | 6   | 7   | 8+  |
//! |--------------|-----|-----|-----|-----|-----|-----|-----|
//! | weight       | 0.8 | 0.7 | 0.6 | ... | 0.2 | 0.1 | 0.1 |
//!
//! All clauses are optional (SHOULD) with no minimum-match, so one matching term is
//! enough for a document to be a hit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::augment::AugmentedQuery;
use crate::error::Result;
use crate::query::{BooleanQuery, Query, QueryParser};

/// Weight of a keyword.
pub const KEYWORD_WEIGHT: f32 = 1.0;

/// Weight of the most relevant synonym, in tenths.
const FIRST_SYNONYM_TENTHS: usize = 8;

/// Lowest weight a synonym can get, in tenths.
const MIN_SYNONYM_TENTHS: usize = 1;

/// Weight of the synonym at zero-based rank `position`.
///
/// Computed on a grid of tenths, so the floor is exact.
///
/// ```
/// use curator::search::synonym_weight;
///
/// assert_eq!(synonym_weight(0), 0.8);
/// assert_eq!(synonym_weight(3), 0.5);
/// assert_eq!(synonym_weight(7), 0.1);
/// assert_eq!(synonym_weight(100), 0.1);
/// ```
pub fn synonym_weight(position: usize) -> f32 {
    let tenths = FIRST_SYNONYM_TENTHS
        .saturating_sub(position)
        .max(MIN_SYNONYM_TENTHS);
    tenths as f32 / 10.0
}

/// Whether a term came from the query itself or is a synonym of one of its keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TermKind {
    /// A keyword of the query.
    Keyword,
    /// A synonym with its zero-based rank under its keyword.
    Synonym {
        /// Rank among the keyword's synonyms.
        rank: usize,
    },
}

/// One term of the weighted disjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    /// Term text as produced by the augmenter, before escaping.
    pub text: String,
    /// Boost applied to the term's clause.
    pub weight: f32,
    /// Keyword or synonym.
    #[serde(flatten)]
    pub kind: TermKind,
}

/// Builds the query for a raw or augmented search over one field.
#[derive(Debug, Clone)]
pub struct WeightedQueryBuilder {
    parser: QueryParser,
}

impl WeightedQueryBuilder {
    /// Create a builder querying `field`, analyzing text with `analyzer`.
    pub fn new<S: Into<String>>(field: S, analyzer: Arc<dyn Analyzer>) -> Self {
        WeightedQueryBuilder {
            parser: QueryParser::new(field, analyzer),
        }
    }

    /// Field every clause targets.
    pub fn field(&self) -> &str {
        self.parser.default_field()
    }

    /// Flatten an augmentation into weighted terms: each keyword followed by its
    /// synonyms, keywords in their original order.
    pub fn weighted_terms(augmented: &AugmentedQuery) -> Vec<WeightedTerm> {
        let mut terms = Vec::with_capacity(augmented.term_count());
        for (keyword, synonyms) in augmented.iter() {
            terms.push(WeightedTerm {
                text: keyword.to_string(),
                weight: KEYWORD_WEIGHT,
                kind: TermKind::Keyword,
            });
            terms.extend(synonyms.iter().enumerate().map(|(rank, synonym)| WeightedTerm {
                text: synonym.clone(),
                weight: synonym_weight(rank),
                kind: TermKind::Synonym { rank },
            }));
        }
        terms
    }

    /// Build the query to run.
    ///
    /// The weighted disjunction of [`weighted_terms`](Self::weighted_terms) when the
    /// augmentation leaves at least one clause, otherwise the escaped raw query.
    pub fn build(
        &self,
        raw_query: &str,
        augmented: Option<&AugmentedQuery>,
    ) -> Result<Box<dyn Query>> {
        match augmented {
            Some(augmented) => match self.build_augmented(augmented)? {
                Some(query) => Ok(Box::new(query)),
                None => self.build_raw(raw_query),
            },
            None => self.build_raw(raw_query),
        }
    }

    /// The raw query, escaped so that it is read as plain words.
    pub fn build_raw(&self, raw_query: &str) -> Result<Box<dyn Query>> {
        self.parser.parse(&QueryParser::escape(raw_query))
    }

    /// One SHOULD clause per weighted term. Terms that analyze to nothing are left out.
    ///
    /// Returns `None` instead of an empty disjunction when no term survives.
    pub fn build_augmented(&self, augmented: &AugmentedQuery) -> Result<Option<BooleanQuery>> {
        let mut query = BooleanQuery::new();
        for term in Self::weighted_terms(augmented) {
            let mut clause = self.parser.parse(&QueryParser::escape(&term.text))?;
            if is_empty_boolean(clause.as_ref()) {
                continue;
            }
            clause.set_boost(clause.boost() * term.weight);
            query.add_should(clause);
        }
        Ok((!query.is_empty()).then_some(query))
    }
}

fn is_empty_boolean(query: &dyn Query) -> bool {
    query
        .as_any()
        .downcast_ref::<BooleanQuery>()
        .is_some_and(BooleanQuery::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;
    use crate::query::{Occur, TermQuery};

    fn builder() -> WeightedQueryBuilder {
        WeightedQueryBuilder::new("analysis", Arc::new(StandardAnalyzer::new()))
    }

    #[test]
    fn test_synonym_weights_decrease_then_floor() {
        let weights: Vec<f32> = (0..12).map(synonym_weight).collect();
        assert_eq!(
            weights,
            vec![0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.1, 0.1, 0.1, 0.1]
        );
        for pair in weights.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert!(weights.iter().all(|w| *w >= 0.1));
    }

    #[test]
    fn test_weighted_terms_order_and_weights() {
        let augmented = AugmentedQuery::new()
            .with("sadness", ["sad", "sorrow", "melancholy"])
            .with("paintings", Vec::<String>::new());

        let terms = WeightedQueryBuilder::weighted_terms(&augmented);
        let summary: Vec<(&str, f32)> =
            terms.iter().map(|t| (t.text.as_str(), t.weight)).collect();
        assert_eq!(
            summary,
            vec![
                ("sadness", 1.0),
                ("sad", 0.8),
                ("sorrow", 0.7),
                ("melancholy", 0.6),
                ("paintings", 1.0),
            ]
        );
        assert_eq!(terms[2].kind, TermKind::Synonym { rank: 1 });
        assert_eq!(terms[4].kind, TermKind::Keyword);
    }

    #[test]
    fn test_augmented_query_is_flat_disjunction() {
        let augmented = AugmentedQuery::new()
            .with("sadness", ["sad"])
            .with("19 century", ["19th century"]);

        let query = builder().build_augmented(&augmented).unwrap().unwrap();
        assert_eq!(query.clauses().len(), 4);
        assert!(query.clauses().iter().all(|c| c.occur == Occur::Should));

        let boosts: Vec<f32> = query.clauses().iter().map(|c| c.query.boost()).collect();
        assert_eq!(boosts, vec![1.0, 0.8, 1.0, 0.8]);

        let first = query.clauses()[0]
            .query
            .as_any()
            .downcast_ref::<TermQuery>()
            .unwrap();
        assert_eq!(first.term(), "sadness");
    }

    #[test]
    fn test_syntax_characters_in_terms_are_escaped() {
        let augmented = AugmentedQuery::new().with("AND", ["(oil)", "c++ -art", "\"quoted"]);
        let query = builder().build_augmented(&augmented).unwrap().unwrap();
        assert_eq!(query.clauses().len(), 4);
    }

    #[test]
    fn test_terms_that_analyze_away_are_dropped() {
        let augmented = AugmentedQuery::new().with("sea", ["!!!", "lake"]);
        let query = builder().build_augmented(&augmented).unwrap().unwrap();
        assert_eq!(query.clauses().len(), 2);
    }

    #[test]
    fn test_raw_path_without_augmentation() {
        let b = builder();
        let raw = b.build("sea (storm", None).unwrap();
        assert!(raw.description().contains("analysis:sea"));
        assert!(raw.description().contains("analysis:storm"));

        let empty = AugmentedQuery::new();
        let fallback = b.build("sea", Some(&empty)).unwrap();
        assert_eq!(fallback.description(), "analysis:sea");
    }

    #[test]
    fn test_augmentation_that_analyzes_away_falls_back_to_raw() {
        let b = builder();
        let augmented = AugmentedQuery::new().with("???", ["!!!"]);
        assert!(b.build_augmented(&augmented).unwrap().is_none());
        assert!(b.build_augmented(&AugmentedQuery::new()).unwrap().is_none());

        let query = b.build("sea", Some(&augmented)).unwrap();
        assert_eq!(query.description(), "analysis:sea");
    }
}
