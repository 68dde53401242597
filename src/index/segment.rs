//! On-disk layout of a committed index.
//!
//! An index is two files in one [`Storage`](crate::storage::Storage):
//!
//! - `segment.bin`: the bincode-encoded [`Segment`] (postings, field lengths,
//!   stored documents)
//! - `meta.json`: [`IndexMeta`], written last; its presence marks a complete commit
//!
//! The meta file carries a CRC32 of the segment bytes so a reader can tell a segment
//! that does not belong to the meta it was committed with.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::vector::VectorSimilarity;

/// Name of the segment file.
pub const SEGMENT_FILE: &str = "segment.bin";

/// Name of the commit metadata file.
pub const META_FILE: &str = "meta.json";

/// Version of the segment encoding.
pub const FORMAT_VERSION: u32 = 1;

/// Dense document identifier, assigned in insertion order starting at 0.
pub type DocId = u32;

/// One entry of a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document containing the term.
    pub doc_id: DocId,
    /// Occurrences of the term in that document's field.
    pub term_freq: u32,
}

/// Inverted index of one text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldIndex {
    /// Term → postings sorted by doc id.
    pub postings: BTreeMap<String, Vec<Posting>>,
    /// Token count of the field per document (0 when the document lacks the field).
    pub lengths: Vec<u32>,
    /// Number of documents that have this field.
    pub doc_count: u64,
    /// Sum of all field lengths.
    pub total_length: u64,
}

impl FieldIndex {
    /// Average field length over the documents that have the field.
    pub fn avg_length(&self) -> f64 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_length as f64 / self.doc_count as f64
        }
    }
}

/// Declared shape of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorFieldInfo {
    /// Dimension every vector in the field has.
    pub dimension: usize,
    /// Similarity the vectors were declared with.
    pub similarity: VectorSimilarity,
}

/// Everything a reader needs, in one serializable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Inverted index per text field.
    pub fields: BTreeMap<String, FieldIndex>,
    /// Vector field declarations.
    pub vector_fields: BTreeMap<String, VectorFieldInfo>,
    /// Stored documents, indexed by doc id.
    pub documents: Vec<Document>,
}

impl Segment {
    /// Encode with bincode.
    pub fn encode(&self) -> crate::error::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn decode(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Commit metadata stored as JSON next to the segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Segment encoding version.
    pub version: u32,
    /// Number of documents in the segment.
    pub doc_count: u64,
    /// Size of `segment.bin` in bytes.
    pub segment_size: u64,
    /// CRC32 of `segment.bin`.
    pub checksum: u32,
    /// When the commit happened.
    pub created_at: DateTime<Utc>,
}

impl IndexMeta {
    /// Build the meta for freshly encoded segment bytes.
    pub fn for_segment(doc_count: u64, segment: &[u8]) -> Self {
        IndexMeta {
            version: FORMAT_VERSION,
            doc_count,
            segment_size: segment.len() as u64,
            checksum: crc32fast::hash(segment),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding_keeps_documents() {
        let mut segment = Segment::default();
        segment.documents.push(
            Document::builder()
                .add_text("TITLE", "Irises")
                .build(),
        );
        let mut field = FieldIndex::default();
        field.postings.insert(
            "irises".to_string(),
            vec![Posting {
                doc_id: 0,
                term_freq: 1,
            }],
        );
        field.lengths.push(1);
        field.doc_count = 1;
        field.total_length = 1;
        segment.fields.insert("TITLE".to_string(), field);

        let bytes = segment.encode().unwrap();
        assert_eq!(Segment::decode(&bytes).unwrap(), segment);
    }

    #[test]
    fn test_meta_checksum() {
        let meta = IndexMeta::for_segment(3, b"abc");
        assert_eq!(meta.version, FORMAT_VERSION);
        assert_eq!(meta.segment_size, 3);
        assert_eq!(meta.checksum, crc32fast::hash(b"abc"));
    }

    #[test]
    fn test_avg_length_of_empty_field() {
        assert_eq!(FieldIndex::default().avg_length(), 0.0);
    }
}
