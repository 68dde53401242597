//! Read-only access to a committed index.

use std::sync::Arc;

use log::debug;

use crate::document::Document;
use crate::error::{CuratorError, Result};
use crate::index::segment::{
    DocId, FORMAT_VERSION, FieldIndex, IndexMeta, META_FILE, Posting, SEGMENT_FILE, Segment,
    VectorFieldInfo,
};
use crate::storage::{Storage, read_all};

/// Trait for index readers.
pub trait IndexReader: Send + Sync + std::fmt::Debug {
    /// Number of documents in the index.
    fn doc_count(&self) -> u64;

    /// One past the highest doc id.
    fn max_doc(&self) -> DocId;

    /// Stored fields of a document.
    fn document(&self, doc_id: DocId) -> Option<&Document>;

    /// Postings of a term in a field, sorted by doc id.
    fn postings(&self, field: &str, term: &str) -> Option<&[Posting]>;

    /// Statistics of a term in a field.
    fn term_info(&self, field: &str, term: &str) -> Option<TermInfo> {
        self.postings(field, term).map(|postings| TermInfo {
            doc_freq: postings.len() as u64,
            total_freq: postings.iter().map(|p| p.term_freq as u64).sum(),
        })
    }

    /// Statistics of a text field.
    fn field_stats(&self, field: &str) -> Option<FieldStats>;

    /// Token count of `field` in one document.
    fn field_length(&self, field: &str, doc_id: DocId) -> u32;
}

/// Information about a term in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermInfo {
    /// Number of documents containing this term.
    pub doc_freq: u64,
    /// Total number of occurrences of this term.
    pub total_freq: u64,
}

/// Statistics about a field in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Number of documents with this field.
    pub doc_count: u64,
    /// Number of distinct terms.
    pub unique_terms: u64,
    /// Average field length.
    pub avg_length: f64,
}

/// Reader over the single segment of a committed index.
///
/// The whole segment is loaded into memory on open; the reader never writes.
#[derive(Debug)]
pub struct SegmentReader {
    meta: IndexMeta,
    segment: Segment,
}

impl SegmentReader {
    /// Open the index committed in `storage`.
    ///
    /// # Errors
    ///
    /// [`CuratorError::Index`] when no index has been committed, or when the meta
    /// file or segment is unreadable, corrupt, or of an unknown version.
    pub fn open(storage: &dyn Storage) -> Result<Self> {
        if !storage.file_exists(META_FILE) {
            return Err(CuratorError::index(format!(
                "no index found in {storage:?} (missing {META_FILE})"
            )));
        }

        let meta_bytes = read_all(storage, META_FILE)?;
        let meta: IndexMeta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| CuratorError::index(format!("corrupt {META_FILE}: {e}")))?;
        if meta.version != FORMAT_VERSION {
            return Err(CuratorError::index(format!(
                "unsupported index version {} (expected {FORMAT_VERSION})",
                meta.version
            )));
        }

        let bytes = read_all(storage, SEGMENT_FILE).map_err(|e| match e {
            CuratorError::NotFound(_) => {
                CuratorError::index(format!("{SEGMENT_FILE} is missing"))
            }
            other => other,
        })?;
        if bytes.len() as u64 != meta.segment_size || crc32fast::hash(&bytes) != meta.checksum {
            return Err(CuratorError::index(format!(
                "corrupt {SEGMENT_FILE}: checksum or size does not match {META_FILE}"
            )));
        }

        let segment = Segment::decode(&bytes)
            .map_err(|e| CuratorError::index(format!("corrupt {SEGMENT_FILE}: {e}")))?;
        if segment.documents.len() as u64 != meta.doc_count {
            return Err(CuratorError::index(format!(
                "{SEGMENT_FILE} holds {} documents but {META_FILE} declares {}",
                segment.documents.len(),
                meta.doc_count
            )));
        }

        debug!(
            "Opened index with {} documents committed at {}",
            meta.doc_count, meta.created_at
        );
        Ok(SegmentReader { meta, segment })
    }

    /// Open and wrap in an `Arc` for sharing.
    pub fn open_shared(storage: &dyn Storage) -> Result<Arc<dyn IndexReader>> {
        Ok(Arc::new(Self::open(storage)?))
    }

    /// Commit metadata.
    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Names of the indexed text fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segment.fields.keys().map(String::as_str)
    }

    /// Declaration of a vector field.
    pub fn vector_field(&self, field: &str) -> Option<&VectorFieldInfo> {
        self.segment.vector_fields.get(field)
    }

    fn field(&self, field: &str) -> Option<&FieldIndex> {
        self.segment.fields.get(field)
    }
}

impl IndexReader for SegmentReader {
    fn doc_count(&self) -> u64 {
        self.segment.documents.len() as u64
    }

    fn max_doc(&self) -> DocId {
        self.segment.documents.len() as DocId
    }

    fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.segment.documents.get(doc_id as usize)
    }

    fn postings(&self, field: &str, term: &str) -> Option<&[Posting]> {
        self.field(field)
            .and_then(|f| f.postings.get(term))
            .map(Vec::as_slice)
    }

    fn field_stats(&self, field: &str) -> Option<FieldStats> {
        self.field(field).map(|f| FieldStats {
            doc_count: f.doc_count,
            unique_terms: f.postings.len() as u64,
            avg_length: f.avg_length(),
        })
    }

    fn field_length(&self, field: &str, doc_id: DocId) -> u32 {
        self.field(field)
            .and_then(|f| f.lengths.get(doc_id as usize).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::writer::{IndexWriter, IndexWriterConfig};
    use crate::storage::MemoryStorage;

    fn committed_storage() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let mut writer = IndexWriter::new(storage.clone(), IndexWriterConfig::default()).unwrap();
        writer
            .add_document(Document::builder().add_text("TITLE", "Irises").build())
            .unwrap();
        writer.commit().unwrap();
        storage
    }

    #[test]
    fn test_open_without_index() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            SegmentReader::open(&storage),
            Err(CuratorError::Index(_))
        ));
    }

    #[test]
    fn test_open_detects_corrupt_segment() {
        let storage = committed_storage();
        let mut bytes = read_all(storage.as_ref(), SEGMENT_FILE).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        storage.put(SEGMENT_FILE, &bytes);

        assert!(matches!(
            SegmentReader::open(storage.as_ref()),
            Err(CuratorError::Index(_))
        ));
    }

    #[test]
    fn test_open_detects_corrupt_meta() {
        let storage = committed_storage();
        storage.put(META_FILE, b"{ not json");
        assert!(matches!(
            SegmentReader::open(storage.as_ref()),
            Err(CuratorError::Index(_))
        ));

        storage.delete_file(META_FILE).unwrap();
        assert!(SegmentReader::open(storage.as_ref()).is_err());
    }

    #[test]
    fn test_missing_segment() {
        let storage = committed_storage();
        storage.delete_file(SEGMENT_FILE).unwrap();
        assert!(matches!(
            SegmentReader::open(storage.as_ref()),
            Err(CuratorError::Index(_))
        ));
    }

    #[test]
    fn test_reader_accessors() {
        let storage = committed_storage();
        let reader = SegmentReader::open(storage.as_ref()).unwrap();

        assert_eq!(reader.meta().doc_count, 1);
        assert_eq!(reader.max_doc(), 1);
        assert_eq!(reader.field_names().collect::<Vec<_>>(), vec!["TITLE"]);
        assert!(reader.document(1).is_none());
        assert_eq!(reader.field_stats("TITLE").unwrap().unique_terms, 1);
    }
}
