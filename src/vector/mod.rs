//! Dense vectors and the fixed-format vector store they are loaded from.
//!
//! Vectors are precomputed elsewhere (sentence embeddings of the artwork analysis
//! text) and attached to documents at indexing time. No similarity search is run
//! against them at query time.

pub mod store;
pub mod writer;

use serde::{Deserialize, Serialize};

pub use store::VectorStore;
pub use writer::VectorStoreWriter;

/// A dense vector of 32-bit floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector components.
    pub data: Vec<f32>,
}

impl Vector {
    /// Create a new vector.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Borrow the components.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

/// The similarity function a vector field is declared with.
///
/// Recorded alongside the vectors in the index so that a later nearest-neighbour
/// reader knows how the embeddings were meant to be compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorSimilarity {
    /// Inner product; embeddings are expected to be unit-normalized.
    #[default]
    DotProduct,
    /// Cosine similarity.
    Cosine,
    /// Negative Euclidean distance.
    Euclidean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_dimension() {
        let v = Vector::from(vec![0.5, -1.0, 2.0]);
        assert_eq!(v.dimension(), 3);
        assert_eq!(v.as_slice()[1], -1.0);
    }

    #[test]
    fn test_similarity_serde_name() {
        let json = serde_json::to_string(&VectorSimilarity::DotProduct).unwrap();
        assert_eq!(json, "\"dot_product\"");
    }
}
