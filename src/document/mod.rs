//! Documents and the tabular input they are assembled from.
//!
//! A [`Document`] holds named [`FieldValue`]s: analyzed text fields and an attached
//! embedding vector. [`columnar`] reads the CSV metadata that supplies the text.

pub mod columnar;
#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

pub use columnar::{ColumnData, ColumnarReader};
pub use document::{Document, DocumentBuilder};
pub use field_value::FieldValue;
