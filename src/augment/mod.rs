//! LLM query augmentation.
//!
//! An augmenter turns a free-text query into its keywords, each with synonyms ranked
//! by relevance. Augmentation is best effort: a failure is reported as
//! [`Augmentation::Unavailable`] and the caller searches with the raw query instead.

pub mod gemini;
pub mod prompt;
pub mod types;

use std::fmt::Debug;

use crate::config::AugmentationConfig;
use crate::error::Result;

pub use gemini::GeminiAugmenter;
pub use prompt::{build_prompt, decode_augmented_query, extract_json_span};
pub use types::{Augmentation, AugmentedQuery, UnavailableReason};

/// Produces keyword/synonym expansions for queries.
pub trait QueryAugmenter: Send + Sync + Debug {
    /// Augment one query. Never fails; problems surface as
    /// [`Augmentation::Unavailable`].
    fn augment(&self, query: &str) -> Augmentation;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Augmenter that never augments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAugmenter;

impl QueryAugmenter for NoAugmenter {
    fn augment(&self, _query: &str) -> Augmentation {
        Augmentation::Unavailable(UnavailableReason::Disabled)
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Build the augmenter the configuration asks for.
pub fn augmenter_from_config(config: &AugmentationConfig) -> Result<Box<dyn QueryAugmenter>> {
    if config.enabled {
        Ok(Box::new(GeminiAugmenter::new(config)?))
    } else {
        Ok(Box::new(NoAugmenter))
    }
}
