//! Index writer: analyzes documents into an in-memory segment and commits it.
//!
//! Nothing reaches storage until [`IndexWriter::commit`]. Dropping a writer without
//! committing leaves the storage exactly as it was, which is how a failed indexing
//! run avoids publishing a partial index.
//!
//! Every writer starts from an empty segment (create mode). A commit therefore
//! replaces whatever index the storage held before.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, info};

use crate::analysis::{Analyzer, StandardAnalyzer};
use crate::document::{Document, FieldValue};
use crate::error::{CuratorError, Result};
use crate::index::segment::{
    DocId, FieldIndex, IndexMeta, META_FILE, Posting, SEGMENT_FILE, Segment, VectorFieldInfo,
};
use crate::storage::Storage;

/// Configuration for [`IndexWriter`].
#[derive(Debug, Clone)]
pub struct IndexWriterConfig {
    /// Analyzer applied to every text field.
    pub analyzer: Arc<dyn Analyzer>,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            analyzer: Arc::new(StandardAnalyzer::new()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FieldBuffer {
    postings: AHashMap<String, Vec<Posting>>,
    lengths: Vec<u32>,
    doc_count: u64,
    total_length: u64,
}

impl FieldBuffer {
    fn into_field_index(mut self, max_doc: usize) -> FieldIndex {
        self.lengths.resize(max_doc, 0);
        FieldIndex {
            postings: self.postings.into_iter().collect::<BTreeMap<_, _>>(),
            lengths: self.lengths,
            doc_count: self.doc_count,
            total_length: self.total_length,
        }
    }
}

/// Builds an index in memory and commits it atomically to a [`Storage`].
#[derive(Debug)]
pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    config: IndexWriterConfig,
    fields: AHashMap<String, FieldBuffer>,
    vector_fields: AHashMap<String, VectorFieldInfo>,
    documents: Vec<Document>,
    committed: usize,
}

impl IndexWriter {
    /// Create a writer over `storage`, removing temp files left by an earlier
    /// interrupted commit.
    pub fn new(storage: Arc<dyn Storage>, config: IndexWriterConfig) -> Result<Self> {
        for name in storage.list_files()? {
            if is_commit_temp(&name) {
                debug!("Removing stale temp file {name}");
                storage.delete_file(&name)?;
            }
        }

        Ok(IndexWriter {
            storage,
            config,
            fields: AHashMap::new(),
            vector_fields: AHashMap::new(),
            documents: Vec::new(),
            committed: 0,
        })
    }

    /// Analyze and buffer a document. Returns the doc id it will have.
    ///
    /// # Errors
    ///
    /// [`CuratorError::Index`] when a vector field's dimension differs from earlier
    /// documents, or when the doc id space is exhausted. The document is not added.
    pub fn add_document(&mut self, doc: Document) -> Result<DocId> {
        let doc_id = DocId::try_from(self.documents.len())
            .map_err(|_| CuratorError::index("document limit reached"))?;

        let mut analyzed = Vec::new();
        let mut vectors = Vec::new();
        for (name, value) in doc.fields() {
            match value {
                FieldValue::Text(text) => {
                    let mut freqs: AHashMap<String, u32> = AHashMap::new();
                    let mut length = 0u32;
                    for token in self.config.analyzer.analyze(text)? {
                        *freqs.entry(token.text).or_insert(0) += 1;
                        length += 1;
                    }
                    analyzed.push((name.to_string(), freqs, length));
                }
                FieldValue::Vector { vector, similarity } => {
                    if let Some(info) = self.vector_fields.get(name) {
                        if info.dimension != vector.dimension() {
                            return Err(CuratorError::index(format!(
                                "vector field '{name}' has dimension {} but earlier \
                                 documents use {}",
                                vector.dimension(),
                                info.dimension
                            )));
                        }
                    }
                    vectors.push((
                        name.to_string(),
                        VectorFieldInfo {
                            dimension: vector.dimension(),
                            similarity: *similarity,
                        },
                    ));
                }
            }
        }

        for (name, freqs, length) in analyzed {
            let field = self.fields.entry(name).or_default();
            for (term, term_freq) in freqs {
                field
                    .postings
                    .entry(term)
                    .or_default()
                    .push(Posting { doc_id, term_freq });
            }
            field.lengths.resize(doc_id as usize, 0);
            field.lengths.push(length);
            field.doc_count += 1;
            field.total_length += length as u64;
        }
        for (name, info) in vectors {
            self.vector_fields.entry(name).or_insert(info);
        }

        self.documents.push(doc);
        Ok(doc_id)
    }

    /// Number of documents added since the last commit.
    pub fn pending_docs(&self) -> u64 {
        (self.documents.len() - self.committed) as u64
    }

    /// Number of documents buffered in total.
    pub fn doc_count(&self) -> u64 {
        self.documents.len() as u64
    }

    /// Publish every buffered document, replacing any index already in storage.
    ///
    /// The segment and meta file are written under temporary names and renamed into
    /// place, meta last.
    pub fn commit(&mut self) -> Result<IndexMeta> {
        let max_doc = self.documents.len();
        let segment = Segment {
            fields: self
                .fields
                .iter()
                .map(|(name, buffer)| (name.clone(), buffer.clone().into_field_index(max_doc)))
                .collect(),
            vector_fields: self
                .vector_fields
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            documents: self.documents.clone(),
        };

        let bytes = segment.encode()?;
        let meta = IndexMeta::for_segment(max_doc as u64, &bytes);
        let meta_bytes = serde_json::to_vec_pretty(&meta)?;

        let segment_tmp = self.write_temp(SEGMENT_FILE, &bytes)?;
        let meta_tmp = self.write_temp(META_FILE, &meta_bytes)?;
        self.storage.rename_file(&segment_tmp, SEGMENT_FILE)?;
        self.storage.rename_file(&meta_tmp, META_FILE)?;
        self.storage.sync()?;

        self.committed = max_doc;
        info!(
            "Committed {} documents ({} bytes, crc32 {:08x})",
            meta.doc_count, meta.segment_size, meta.checksum
        );
        Ok(meta)
    }

    fn write_temp(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let (temp_name, mut output) = self.storage.create_temp_output(name)?;
        output.write_all(bytes)?;
        output.flush_and_sync()?;
        Ok(temp_name)
    }
}

/// Whether `name` was created by [`Storage::create_temp_output`] for one of the
/// index files, i.e. `segment.bin.<uuid>.tmp` or `meta.json.<uuid>.tmp`.
fn is_commit_temp(name: &str) -> bool {
    let Some((prefix, id)) = name
        .strip_suffix(".tmp")
        .and_then(|stem| stem.rsplit_once('.'))
    else {
        return false;
    };
    (prefix == SEGMENT_FILE || prefix == META_FILE)
        && id.len() == 32
        && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::reader::{IndexReader, SegmentReader};
    use crate::storage::MemoryStorage;
    use crate::vector::Vector;

    fn doc(title: &str, analysis: &str, vector: Vec<f32>) -> Document {
        Document::builder()
            .add_text("TITLE", title)
            .add_text("analysis", analysis)
            .add_vector("embedding", Vector::new(vector))
            .build()
    }

    #[test]
    fn test_nothing_is_visible_before_commit() {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        writer.add_document(doc("A", "red sky", vec![1.0])).unwrap();

        assert_eq!(writer.pending_docs(), 1);
        assert_eq!(storage.file_count(), 0);
        assert!(SegmentReader::open(storage.as_ref()).is_err());
    }

    #[test]
    fn test_commit_and_read_back() {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        let a = writer.add_document(doc("A", "Red sky, red sea", vec![1.0, 0.0]));
        let b = writer.add_document(doc("B", "Blue sea", vec![0.0, 1.0]));
        assert_eq!(a.unwrap(), 0);
        assert_eq!(b.unwrap(), 1);
        let meta = writer.commit().unwrap();
        assert_eq!(meta.doc_count, 2);
        assert_eq!(writer.pending_docs(), 0);

        let reader = SegmentReader::open(storage.as_ref()).unwrap();
        assert_eq!(reader.doc_count(), 2);
        assert_eq!(
            reader.postings("analysis", "red").unwrap(),
            &[Posting {
                doc_id: 0,
                term_freq: 2
            }]
        );
        assert_eq!(reader.term_info("analysis", "sea").unwrap().doc_freq, 2);
        assert_eq!(reader.field_length("analysis", 0), 4);
        assert_eq!(reader.field_stats("analysis").unwrap().avg_length, 3.0);
        assert_eq!(reader.document(1).unwrap().get_text("TITLE"), Some("B"));
        assert_eq!(reader.vector_field("embedding").unwrap().dimension, 2);
        assert!(storage.list_files().unwrap().iter().all(|n| !n.ends_with(".tmp")));
    }

    #[test]
    fn test_vector_dimension_mismatch_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage, IndexWriterConfig::default()).unwrap();
        writer.add_document(doc("A", "x", vec![1.0, 2.0])).unwrap();

        let result = writer.add_document(doc("B", "y", vec![1.0]));
        assert!(matches!(result, Err(CuratorError::Index(_))));
        assert_eq!(writer.doc_count(), 1);
    }

    #[test]
    fn test_second_writer_replaces_index() {
        let storage = Arc::new(MemoryStorage::new());

        let mut first = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        for title in ["A", "B", "C"] {
            first.add_document(doc(title, "old", vec![0.0])).unwrap();
        }
        first.commit().unwrap();

        let mut second = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        second.add_document(doc("Z", "new", vec![0.0])).unwrap();
        second.commit().unwrap();

        let reader = SegmentReader::open(storage.as_ref()).unwrap();
        assert_eq!(reader.doc_count(), 1);
        assert!(reader.postings("analysis", "old").is_none());
    }

    #[test]
    fn test_missing_field_has_zero_length() {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        writer
            .add_document(Document::builder().add_text("TITLE", "only title").build())
            .unwrap();
        writer.add_document(doc("B", "text here", vec![0.5])).unwrap();
        writer.commit().unwrap();

        let reader = SegmentReader::open(storage.as_ref()).unwrap();
        assert_eq!(reader.field_length("analysis", 0), 0);
        assert_eq!(reader.field_length("analysis", 1), 2);
        assert_eq!(reader.field_stats("analysis").unwrap().doc_count, 1);
    }

    #[test]
    fn test_only_commit_temp_files_are_cleaned_up() {
        let storage = Arc::new(MemoryStorage::new());
        let (stale, mut output) = storage.create_temp_output(SEGMENT_FILE).unwrap();
        output.write_all(b"partial").unwrap();
        drop(output);
        let mut notes = storage.create_output("notes.tmp").unwrap();
        notes.write_all(b"keep me").unwrap();
        drop(notes);

        IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();

        assert!(!storage.file_exists(&stale));
        assert!(storage.file_exists("notes.tmp"));
        assert!(is_commit_temp("meta.json.0123456789abcdef0123456789abcdef.tmp"));
        assert!(!is_commit_temp("meta.json.backup.tmp"));
        assert!(!is_commit_temp("other.bin.0123456789abcdef0123456789abcdef.tmp"));
    }
}
