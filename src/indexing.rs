//! Full-rebuild indexing of the artwork metadata and its embeddings.
//!
//! Row `i` of the CSV and vector `i` of the vector store describe the same artwork.
//! The pipeline pairs them into one document per row and commits the whole set as a
//! fresh index, replacing whatever the storage held before.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use crate::analysis::{Analyzer, StandardAnalyzer};
use crate::config::CuratorConfig;
use crate::document::{ColumnarReader, Document};
use crate::error::{CuratorError, Result};
use crate::index::{IndexWriter, IndexWriterConfig};
use crate::storage::Storage;
use crate::vector::VectorSimilarity;
use crate::vector::store::VectorStore;

/// Artwork title, shown for every hit.
pub const TITLE_FIELD: &str = "TITLE";
/// Artist name.
pub const AUTHOR_FIELD: &str = "AUTHOR";
/// Where the artwork is held.
pub const LOCATION_FIELD: &str = "LOCATION";
/// Free-text analysis of the artwork; the default search field.
pub const ANALYSIS_FIELD: &str = "analysis";
/// Embedding of the artwork.
pub const EMBEDDING_FIELD: &str = "embedding";

/// Rows between progress log lines.
const PROGRESS_INTERVAL: usize = 10_000;

/// Outcome of a successful indexing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexingReport {
    /// Documents in the committed index.
    pub documents: u64,
    /// Dimension of the indexed vectors.
    pub vector_dimension: usize,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

/// Builds an index from a CSV file and a vector store.
#[derive(Debug, Clone)]
pub struct IndexingPipeline {
    columns: Vec<String>,
    vector_field: String,
    similarity: VectorSimilarity,
    analyzer: Arc<dyn Analyzer>,
    reader: ColumnarReader,
}

impl IndexingPipeline {
    /// Create a pipeline indexing the configured columns with the standard analyzer.
    pub fn new(config: &CuratorConfig) -> Self {
        IndexingPipeline {
            columns: config.columns.clone(),
            vector_field: config.vector_field.clone(),
            similarity: config.similarity,
            analyzer: Arc::new(StandardAnalyzer::new()),
            reader: ColumnarReader::new(),
        }
    }

    /// Replace the analyzer applied to text columns.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Replace the CSV reader.
    pub fn with_reader(mut self, reader: ColumnarReader) -> Self {
        self.reader = reader;
        self
    }

    /// Columns indexed as text fields.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index every row of `data_path` together with its vector from `vectors_path`.
    ///
    /// Nothing is written unless every row is indexed, so a failed run leaves any
    /// earlier index in `storage` intact.
    ///
    /// # Errors
    ///
    /// - [`CuratorError::NotFound`] if either input is missing
    /// - [`CuratorError::Parse`] if the CSV is malformed or its columns differ in length
    /// - [`CuratorError::OutOfRange`] if the row count differs from the vector count
    /// - [`CuratorError::Storage`] / [`CuratorError::Index`] if the commit fails
    pub fn run(
        &self,
        storage: Arc<dyn Storage>,
        data_path: &Path,
        vectors_path: &Path,
    ) -> Result<IndexingReport> {
        let start = Instant::now();

        let data = self.reader.read_columns_from_path(data_path, &self.columns)?;
        let rows = data.ensure_aligned()?;
        let store = VectorStore::open(vectors_path)?;

        if rows != store.vector_count() {
            return Err(CuratorError::out_of_range(format!(
                "{} has {rows} rows but {} holds {} vectors",
                data_path.display(),
                vectors_path.display(),
                store.vector_count()
            )));
        }
        info!(
            "Indexing {} rows of {} columns with {}-dimensional vectors",
            rows,
            data.column_count(),
            store.dimension()
        );

        let config = IndexWriterConfig {
            analyzer: Arc::clone(&self.analyzer),
        };
        let mut writer = IndexWriter::new(storage, config)?;

        for i in 0..rows {
            let mut builder = Document::builder();
            for (column, value) in data.row(i) {
                builder = builder.add_text(column, value);
            }
            let vector = store.load_vector(i as i64)?;
            let doc = builder
                .add_vector_with_similarity(self.vector_field.as_str(), vector, self.similarity)
                .build();
            writer.add_document(doc)?;

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                debug!("Indexed {} of {} rows", i + 1, rows);
            }
        }

        let meta = writer.commit()?;
        let elapsed = start.elapsed();
        info!(
            "Indexed {} documents in {} ms",
            meta.doc_count,
            elapsed.as_millis()
        );

        Ok(IndexingReport {
            documents: meta.doc_count,
            vector_dimension: store.dimension(),
            elapsed,
        })
    }
}
