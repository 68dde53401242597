//! Prompt construction and decoding of the model's keyword/synonym output.

use std::fmt;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

use crate::augment::types::{AugmentedQuery, UnavailableReason};

lazy_static! {
    /// First `{` to last `}`, across newlines.
    static ref JSON_SPAN: Regex = Regex::new(r"(?s)\{.*\}").expect("valid regex");
}

const INSTRUCTION: &str = "You will be given a user's search query on an art image platform. \
Output the keywords in the original query with their synonyms. \
The synonyms should be ranked in the descending order of their relevance to the original query. \
Examples:\n";

const EXAMPLE_1: &str = "Query 1: sadness 19 century paintings. \
Output 1: {\"sadness\": [\"sad\", \"sorrow\", \"sorrowful\", \"melancholy\", \"unhappiness\", \
\"despair\", \"depression\"], \"19 century\": [\"19th century\", \"nineteenth century\"]}\n";

const EXAMPLE_2: &str = "Query 2: show me pictures of fruit having vibrant colors. \
Output 2: {\"fruit\": [\"apple\", \"banana\", \"peach\", \"pear\", \"orange\", \"plant\", \
\"vegetable\"], \"vibrant colors\": [\"bright colors\", \"vivid colors\", \"radiant colors\", \
\"intense colors\", \"rich colors\", \"bold colors\", \"luminous colors\", \"dynamic colors\", \
\"vibrant hues\"]}\n";

/// Build the instruction sent to the model for `query`.
///
/// The prompt asks for the query's keywords with ranked synonyms, shows two worked
/// examples, and requests the answer in the same JSON format.
pub fn build_prompt(query: &str) -> String {
    format!(
        "{INSTRUCTION}{EXAMPLE_1}{EXAMPLE_2}Query: {query}. \
         Provide your output in the same json format as the example outputs."
    )
}

/// The greedy `{ ... }` span of `text`: from the first `{` to the last `}`.
pub fn extract_json_span(text: &str) -> Option<&str> {
    JSON_SPAN.find(text).map(|m| m.as_str())
}

/// Keyword to synonyms, in output order, with every keyword appearing once.
struct KeywordEntries(IndexMap<String, Vec<String>>);

impl<'de> Deserialize<'de> for KeywordEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeywordEntriesVisitor;

        impl<'de> Visitor<'de> for KeywordEntriesVisitor {
            type Value = KeywordEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping keywords to arrays of synonyms")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((keyword, synonyms)) = map.next_entry::<String, Vec<String>>()? {
                    if entries.contains_key(&keyword) {
                        return Err(de::Error::custom(format!("duplicate keyword `{keyword}`")));
                    }
                    entries.insert(keyword, synonyms);
                }
                Ok(KeywordEntries(entries))
            }
        }

        deserializer.deserialize_map(KeywordEntriesVisitor)
    }
}

/// Decode model output into an [`AugmentedQuery`].
///
/// The output must contain one JSON object whose values are all arrays of strings,
/// with no keyword repeated. Anything else rejects the whole object; there is no
/// partial result.
pub fn decode_augmented_query(text: &str) -> Result<AugmentedQuery, UnavailableReason> {
    let span = extract_json_span(text).ok_or(UnavailableReason::NoJsonObject)?;

    serde_json::from_str::<KeywordEntries>(span)
        .map(|KeywordEntries(entries)| AugmentedQuery::from(entries))
        .map_err(|e| {
            if e.is_data() {
                UnavailableReason::InvalidShape(e.to_string())
            } else {
                UnavailableReason::InvalidJson(e.to_string())
            }
        })
}
