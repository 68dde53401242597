//! Runtime configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it changes:
//!
//! ```
//! use curator::config::CuratorConfig;
//!
//! let config: CuratorConfig = serde_json::from_str(r#"{"max_hits": 5}"#).unwrap();
//! assert_eq!(config.max_hits, 5);
//! assert_eq!(config.search_field, "analysis");
//! assert_eq!(config.augmentation.model, "gemini-pro");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CuratorError, Result};
use crate::indexing::{ANALYSIS_FIELD, AUTHOR_FIELD, EMBEDDING_FIELD, LOCATION_FIELD, TITLE_FIELD};
use crate::vector::VectorSimilarity;

/// Default Gemini REST endpoint (model name and method are appended).
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Default generative model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

/// Environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration for indexing and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuratorConfig {
    /// CSV metadata file.
    pub data_path: PathBuf,
    /// Binary vector store, one vector per CSV row.
    pub vectors_path: PathBuf,
    /// Directory holding the index.
    pub index_dir: PathBuf,
    /// CSV columns indexed as text fields, in order.
    pub columns: Vec<String>,
    /// Field queried by the search executor.
    pub search_field: String,
    /// Name of the vector field.
    pub vector_field: String,
    /// Similarity declared for the vector field.
    pub similarity: VectorSimilarity,
    /// Default number of hits returned.
    pub max_hits: usize,
    /// LLM query augmentation.
    pub augmentation: AugmentationConfig,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        CuratorConfig {
            data_path: PathBuf::from("art_metadata_filtered.csv"),
            vectors_path: PathBuf::from("embeddings_bert_sentence.bin"),
            index_dir: PathBuf::from("index"),
            columns: [TITLE_FIELD, AUTHOR_FIELD, LOCATION_FIELD, ANALYSIS_FIELD]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            search_field: ANALYSIS_FIELD.to_string(),
            vector_field: EMBEDDING_FIELD.to_string(),
            similarity: VectorSimilarity::DotProduct,
            max_hits: 20,
            augmentation: AugmentationConfig::default(),
        }
    }
}

impl CuratorConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CuratorError::from_open(e, path))?;
        let config: CuratorConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(CuratorError::invalid_config("no columns configured"));
        }
        if self.search_field.is_empty() {
            return Err(CuratorError::invalid_config("search_field is empty"));
        }
        if self.columns.iter().any(|c| *c == self.vector_field) {
            return Err(CuratorError::invalid_config(format!(
                "vector field '{}' collides with a text column",
                self.vector_field
            )));
        }
        if self.max_hits == 0 {
            return Err(CuratorError::invalid_config("max_hits must be at least 1"));
        }
        Ok(())
    }
}

/// Settings of the Gemini augmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Whether queries are sent for augmentation at all.
    pub enabled: bool,
    /// Base URL of the models resource.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Environment variable the API key is read from.
    pub api_key_env: String,
    /// Explicit API key. Takes precedence over the environment and is never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        AugmentationConfig {
            enabled: true,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl AugmentationConfig {
    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The API key: the explicit one, else the configured environment variable.
    /// Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let not_blank = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(not_blank)
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(not_blank))
    }
}
