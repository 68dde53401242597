//! End-to-end search: open the index, optionally augment, build, run.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::analysis::{Analyzer, StandardAnalyzer};
use crate::augment::{Augmentation, QueryAugmenter};
use crate::config::CuratorConfig;
use crate::error::Result;
use crate::index::{IndexSearcher, SegmentReader};
use crate::query::{Query, SearchResults};
use crate::search::weighted::WeightedQueryBuilder;
use crate::storage::Storage;

/// Everything a single search produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// The query text as given.
    pub query: String,
    /// Outcome of augmentation, `None` when it was not requested.
    #[serde(skip)]
    pub augmentation: Option<Augmentation>,
    /// Whether the executed query was the weighted disjunction.
    pub augmented: bool,
    /// Description of the executed query.
    pub executed_query: String,
    /// Ranked hits.
    pub results: SearchResults,
}

/// Runs searches against a built index.
#[derive(Debug)]
pub struct SearchExecutor {
    builder: WeightedQueryBuilder,
    augmenter: Box<dyn QueryAugmenter>,
}

impl SearchExecutor {
    /// Create an executor querying `config.search_field` with the standard analyzer.
    pub fn new(config: &CuratorConfig, augmenter: Box<dyn QueryAugmenter>) -> Self {
        Self::with_analyzer(config, augmenter, Arc::new(StandardAnalyzer::new()))
    }

    /// Create an executor with a custom analyzer. It must match the one used for
    /// indexing.
    pub fn with_analyzer(
        config: &CuratorConfig,
        augmenter: Box<dyn QueryAugmenter>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        SearchExecutor {
            builder: WeightedQueryBuilder::new(config.search_field.clone(), analyzer),
            augmenter,
        }
    }

    /// Return the `limit` best hits for `query`, plus the total match count.
    ///
    /// With `augment` set the augmenter runs first; if it yields nothing the raw
    /// query is searched instead.
    ///
    /// # Errors
    ///
    /// [`crate::error::CuratorError::Index`] when the index is missing or corrupt.
    /// Augmentation problems are never errors.
    pub fn search(
        &self,
        storage: &dyn Storage,
        query: &str,
        limit: usize,
        augment: bool,
    ) -> Result<SearchResults> {
        Ok(self.execute(storage, query, limit, augment)?.results)
    }

    /// Like [`search`](Self::search), also reporting how the query was built.
    pub fn execute(
        &self,
        storage: &dyn Storage,
        query: &str,
        limit: usize,
        augment: bool,
    ) -> Result<SearchReport> {
        let reader = SegmentReader::open_shared(storage)?;

        let augmentation = if augment {
            Some(self.augmenter.augment(query))
        } else {
            None
        };
        let weighted = match augmentation.as_ref().and_then(Augmentation::as_query) {
            Some(augmented_query) => self.builder.build_augmented(augmented_query)?,
            None => None,
        };
        let augmented = weighted.is_some();

        let built: Box<dyn Query> = match weighted {
            Some(weighted) => Box::new(weighted),
            None => self.builder.build_raw(query)?,
        };
        let executed_query = built.description();
        debug!("Executing query: {executed_query}");

        let results = IndexSearcher::new(reader).search(built.as_ref(), limit)?;
        info!(
            "Search '{}' ({}) matched {} documents",
            query,
            if augmented { "augmented" } else { "plain" },
            results.total_hits
        );

        Ok(SearchReport {
            query: query.to_string(),
            augmentation,
            augmented,
            executed_query,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{AugmentedQuery, NoAugmenter, UnavailableReason};
    use crate::document::Document;
    use crate::error::CuratorError;
    use crate::index::{IndexWriter, IndexWriterConfig};
    use crate::storage::MemoryStorage;

    #[derive(Debug)]
    struct FixedAugmenter(AugmentedQuery);

    impl QueryAugmenter for FixedAugmenter {
        fn augment(&self, _query: &str) -> Augmentation {
            Augmentation::Augmented(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn build_index(rows: &[(&str, &str)]) -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        for (title, analysis) in rows {
            writer
                .add_document(
                    Document::builder()
                        .add_text("TITLE", *title)
                        .add_text("analysis", *analysis)
                        .build(),
                )
                .unwrap();
        }
        writer.commit().unwrap();
        storage
    }

    #[test]
    fn test_plain_search() {
        let storage = build_index(&[
            ("Calm", "a calm blue sea"),
            ("Grief", "deep sorrow and grief"),
            ("Storm", "a stormy sea at night"),
        ]);
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(NoAugmenter));

        let report = executor.execute(storage.as_ref(), "sea", 10, false).unwrap();
        assert!(!report.augmented);
        assert!(report.augmentation.is_none());
        assert_eq!(report.results.total_hits, 2);
        let titles: Vec<_> = report.results.hits.iter().filter_map(|h| h.title()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Calm") && titles.contains(&"Storm"));
    }

    #[test]
    fn test_augmented_search_reaches_synonyms() {
        let storage = build_index(&[
            ("Calm", "a calm blue sea"),
            ("Grief", "deep sorrow and grief"),
        ]);
        let augmenter = FixedAugmenter(AugmentedQuery::new().with("sadness", ["sorrow"]));
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(augmenter));

        let report = executor.execute(storage.as_ref(), "sadness", 10, true).unwrap();
        assert!(report.augmented);
        assert_eq!(report.results.total_hits, 1);
        assert_eq!(report.results.hits[0].title(), Some("Grief"));

        let plain = executor.search(storage.as_ref(), "sadness", 10, false).unwrap();
        assert_eq!(plain.total_hits, 0);
    }

    #[test]
    fn test_unavailable_augmentation_falls_back() {
        let storage = build_index(&[("Calm", "a calm blue sea")]);
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(NoAugmenter));

        let report = executor.execute(storage.as_ref(), "sea", 10, true).unwrap();
        assert!(!report.augmented);
        assert_eq!(
            report.augmentation,
            Some(Augmentation::Unavailable(UnavailableReason::Disabled))
        );
        assert_eq!(report.results.total_hits, 1);
    }

    #[test]
    fn test_augmentation_without_searchable_terms_runs_raw_query() {
        let storage = build_index(&[("Calm", "calm sea")]);
        let augmenter = FixedAugmenter(AugmentedQuery::new().with("???", ["!!!"]));
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(augmenter));

        let report = executor.execute(storage.as_ref(), "sea", 10, true).unwrap();
        assert!(!report.augmented);
        assert_eq!(report.executed_query, "analysis:sea");
        assert_eq!(report.results.total_hits, 1);
        assert_eq!(report.results.hits[0].title(), Some("Calm"));
    }

    #[test]
    fn test_limit_truncates_but_total_does_not() {
        let rows: Vec<(String, String)> = (0..5)
            .map(|i| (format!("T{i}"), "sea".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let storage = build_index(&refs);
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(NoAugmenter));

        let results = executor.search(storage.as_ref(), "sea", 2, false).unwrap();
        assert_eq!(results.total_hits, 5);
        assert_eq!(results.hits.len(), 2);
        // equal scores keep index order
        assert_eq!(results.hits[0].title(), Some("T0"));
        assert_eq!(results.hits[1].title(), Some("T1"));
    }

    #[test]
    fn test_missing_index() {
        let executor = SearchExecutor::new(&CuratorConfig::default(), Box::new(NoAugmenter));
        let result = executor.search(&MemoryStorage::new(), "sea", 10, false);
        assert!(matches!(result, Err(CuratorError::Index(_))));
    }
}
