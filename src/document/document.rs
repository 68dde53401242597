//! Document structure handed to the index writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;
use crate::vector::{Vector, VectorSimilarity};

/// A document is a set of named field values.
///
/// Fields are kept in name order so that documents serialize deterministically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field value to the document, replacing any previous value.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a text field value.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    /// Get a vector field value.
    pub fn get_vector(&self, name: &str) -> Option<&Vector> {
        self.fields.get(name).and_then(FieldValue::as_vector)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consume the document, yielding its fields.
    pub fn into_fields(self) -> impl Iterator<Item = (String, FieldValue)> {
        self.fields.into_iter()
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// Fluent builder for [`Document`].
///
/// ```
/// use curator::document::Document;
/// use curator::vector::Vector;
///
/// let doc = Document::builder()
///     .add_text("TITLE", "Wheat Field with Cypresses")
///     .add_vector("embedding", Vector::new(vec![0.1, 0.2]))
///     .build();
///
/// assert_eq!(doc.get_text("TITLE"), Some("Wheat Field with Cypresses"));
/// assert_eq!(doc.get_vector("embedding").unwrap().dimension(), 2);
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add a text field.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document
            .add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add a vector field with the default similarity.
    pub fn add_vector<S: Into<String>>(mut self, name: S, vector: Vector) -> Self {
        self.document.add_field(name, FieldValue::vector(vector));
        self
    }

    /// Add a vector field with an explicit similarity.
    pub fn add_vector_with_similarity<S: Into<String>>(
        mut self,
        name: S,
        vector: Vector,
        similarity: VectorSimilarity,
    ) -> Self {
        self.document
            .add_field(name, FieldValue::Vector { vector, similarity });
        self
    }

    /// Build the document.
    pub fn build(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_fields() {
        let mut doc = Document::new();
        doc.add_field("AUTHOR", FieldValue::from("Monet"));
        doc.add_field("TITLE", FieldValue::from("Water Lilies"));

        assert_eq!(doc.len(), 2);
        assert!(doc.has_field("AUTHOR"));
        assert_eq!(doc.get_text("TITLE"), Some("Water Lilies"));
        assert!(doc.get_vector("TITLE").is_none());

        let names: Vec<&str> = doc.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["AUTHOR", "TITLE"]);
    }

    #[test]
    fn test_add_field_replaces() {
        let mut doc = Document::new();
        doc.add_field("TITLE", FieldValue::from("old"));
        doc.add_field("TITLE", FieldValue::from("new"));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_text("TITLE"), Some("new"));
    }
}
