//! Result types of query augmentation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keywords of a user query, each mapped to synonyms ranked most relevant first.
///
/// Keywords keep the order the model produced them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AugmentedQuery {
    entries: IndexMap<String, Vec<String>>,
}

impl AugmentedQuery {
    /// Create an empty augmentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword with its ranked synonyms. A repeated keyword replaces the
    /// earlier synonyms but keeps its position.
    pub fn insert<K, I, S>(&mut self, keyword: K, synonyms: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            keyword.into(),
            synonyms.into_iter().map(Into::into).collect(),
        );
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<K, I, S>(mut self, keyword: K, synonyms: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(keyword, synonyms);
        self
    }

    /// Keywords in order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Ranked synonyms of one keyword.
    pub fn synonyms(&self, keyword: &str) -> Option<&[String]> {
        self.entries.get(keyword).map(Vec::as_slice)
    }

    /// Iterate over (keyword, synonyms) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keywords.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords plus all synonyms.
    pub fn term_count(&self) -> usize {
        self.entries.values().map(|s| 1 + s.len()).sum()
    }
}

impl From<IndexMap<String, Vec<String>>> for AugmentedQuery {
    fn from(entries: IndexMap<String, Vec<String>>) -> Self {
        AugmentedQuery { entries }
    }
}

/// Why no augmentation could be produced. Never fatal: callers fall back to the
/// raw query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableReason {
    /// Augmentation is switched off.
    #[error("augmentation is disabled")]
    Disabled,

    /// No API key was configured.
    #[error("no API key (set {0})")]
    MissingCredential(String),

    /// The request could not be sent or its body read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response envelope lacked the generated text.
    #[error("unexpected response envelope: {0}")]
    MalformedEnvelope(String),

    /// The generated text contains no `{ ... }` span.
    #[error("no JSON object in model output")]
    NoJsonObject,

    /// The `{ ... }` span is not valid JSON.
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON, but not an object of string arrays.
    #[error("model output has the wrong shape: {0}")]
    InvalidShape(String),
}

/// Outcome of augmenting one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Augmentation {
    /// Keywords and synonyms were produced.
    Augmented(AugmentedQuery),
    /// Nothing usable came back.
    Unavailable(UnavailableReason),
}

impl Augmentation {
    /// The augmented query, if there is one.
    pub fn as_query(&self) -> Option<&AugmentedQuery> {
        match self {
            Augmentation::Augmented(query) => Some(query),
            Augmentation::Unavailable(_) => None,
        }
    }

    /// Consume into the augmented query, if there is one.
    pub fn into_query(self) -> Option<AugmentedQuery> {
        match self {
            Augmentation::Augmented(query) => Some(query),
            Augmentation::Unavailable(_) => None,
        }
    }

    /// Whether augmentation succeeded.
    pub fn is_available(&self) -> bool {
        matches!(self, Augmentation::Augmented(_))
    }
}
