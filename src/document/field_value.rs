//! Field value types for documents.
//!
//! ```
//! use curator::document::field_value::FieldValue;
//!
//! let title = FieldValue::Text("The Starry Night".to_string());
//! assert_eq!(title.as_text(), Some("The Starry Night"));
//! assert!(title.as_vector().is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::vector::{Vector, VectorSimilarity};

/// A value stored in a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text that is analyzed, indexed and stored verbatim.
    Text(String),
    /// A dense vector stored with the similarity it should be compared by.
    Vector {
        /// The vector itself.
        vector: Vector,
        /// Declared similarity function.
        similarity: VectorSimilarity,
    },
}

impl FieldValue {
    /// Create a vector value with the default (dot product) similarity.
    pub fn vector(vector: Vector) -> Self {
        FieldValue::Vector {
            vector,
            similarity: VectorSimilarity::default(),
        }
    }

    /// Get the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Vector { .. } => None,
        }
    }

    /// Get the vector, if this is a vector value.
    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            FieldValue::Vector { vector, .. } => Some(vector),
            FieldValue::Text(_) => None,
        }
    }

    /// Short type name used in error messages and debug output.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Vector { .. } => "vector",
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vector> for FieldValue {
    fn from(v: Vector) -> Self {
        FieldValue::vector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_value_defaults_to_dot_product() {
        let value = FieldValue::from(Vector::new(vec![1.0, 0.0]));
        match &value {
            FieldValue::Vector { similarity, .. } => {
                assert_eq!(*similarity, VectorSimilarity::DotProduct)
            }
            _ => panic!("expected vector"),
        }
        assert_eq!(value.type_name(), "vector");
        assert_eq!(value.as_vector().unwrap().dimension(), 2);
    }
}
