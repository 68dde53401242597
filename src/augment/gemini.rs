//! Query augmentation through the Gemini `generateContent` REST method.

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::augment::prompt::{build_prompt, decode_augmented_query};
use crate::augment::types::{Augmentation, AugmentedQuery, UnavailableReason};
use crate::augment::QueryAugmenter;
use crate::config::AugmentationConfig;
use crate::error::Result;

/// Longest error body kept in [`UnavailableReason::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Request body of `generateContent`.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response envelope of `generateContent`. Only the generated text is read.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Augmenter backed by a Gemini model.
///
/// Performs one blocking request per query with no retry. Every failure degrades to
/// [`Augmentation::Unavailable`] and is logged at `warn`.
///
/// ```no_run
/// use curator::augment::{GeminiAugmenter, QueryAugmenter};
/// use curator::config::AugmentationConfig;
///
/// # fn example() -> curator::error::Result<()> {
/// let augmenter = GeminiAugmenter::new(&AugmentationConfig::default())?;
/// if let Some(query) = augmenter.augment("sad paintings").into_query() {
///     for (keyword, synonyms) in query.iter() {
///         println!("{keyword}: {synonyms:?}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GeminiAugmenter {
    client: Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl GeminiAugmenter {
    /// Create an augmenter from configuration. The API key is resolved once, here.
    ///
    /// # Errors
    ///
    /// [`crate::error::CuratorError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &AugmentationConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(GeminiAugmenter {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: config.resolve_api_key(),
        })
    }

    /// Replace the API key.
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether an API key is available.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model name requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    /// Send the prompt and return the generated text.
    fn generate(&self, prompt: &str) -> std::result::Result<String, UnavailableReason> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UnavailableReason::MissingCredential(self.api_key_env.clone()))?;

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .map_err(|e| UnavailableReason::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| UnavailableReason::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(UnavailableReason::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| UnavailableReason::MalformedEnvelope(e.to_string()))?;

        envelope.into_first_text().ok_or_else(|| {
            UnavailableReason::MalformedEnvelope(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
    }

    fn try_augment(&self, query: &str) -> std::result::Result<AugmentedQuery, UnavailableReason> {
        let text = self.generate(&build_prompt(query))?;
        debug!("Model output for '{query}': {text}");
        decode_augmented_query(&text)
    }
}

impl QueryAugmenter for GeminiAugmenter {
    fn augment(&self, query: &str) -> Augmentation {
        match self.try_augment(query) {
            Ok(augmented) => {
                debug!(
                    "Augmented '{}' into {} keywords ({} terms)",
                    query,
                    augmented.len(),
                    augmented.term_count()
                );
                Augmentation::Augmented(augmented)
            }
            Err(reason) => {
                warn!("Query augmentation unavailable, using the raw query: {reason}");
                Augmentation::Unavailable(reason)
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// A generation endpoint answering every `generateContent` call for key `k` with
    /// `response`, expected to be called exactly once.
    ///
    /// The client under test is blocking, so the mock is set up on its own runtime
    /// and the request is made outside of it.
    fn mock_gemini(response: ResponseTemplate) -> (Runtime, MockServer) {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path_regex(":generateContent$"))
                .and(query_param("key", "k"))
                .respond_with(response)
                .expect(1)
                .mount(&server)
                .await;
            server
        });
        (runtime, server)
    }

    fn config_for(endpoint: &str) -> AugmentationConfig {
        AugmentationConfig {
            endpoint: endpoint.to_string(),
            api_key_env: "CURATOR_TEST_UNSET_KEY_VAR".to_string(),
            timeout_secs: Some(5),
            ..Default::default()
        }
    }

    fn augmenter_for(server: &MockServer) -> GeminiAugmenter {
        GeminiAugmenter::new(&config_for(&format!("{}/v1/models", server.uri())))
            .unwrap()
            .with_api_key("k")
    }

    fn envelope(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    #[test]
    fn test_successful_augmentation() {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/models/gemini-pro:generateContent"))
                .and(query_param("key", "test-key"))
                .and(body_string_contains("\"role\":\"user\""))
                .and(body_string_contains("Query: sadness paintings."))
                .respond_with(envelope(
                    "```json\n{\"sadness\": [\"sad\", \"sorrow\"], \"paintings\": []}\n```",
                ))
                .expect(1)
                .mount(&server)
                .await;
            server
        });
        let augmenter = GeminiAugmenter::new(&config_for(&format!("{}/v1/models", server.uri())))
            .unwrap()
            .with_api_key("test-key");

        let augmentation = augmenter.augment("sadness paintings");
        let query = augmentation.into_query().expect("augmented");
        assert_eq!(query.keywords().collect::<Vec<_>>(), vec!["sadness", "paintings"]);
        assert_eq!(query.synonyms("sadness").unwrap(), &["sad", "sorrow"]);
    }

    #[test]
    fn test_missing_credential() {
        let augmenter = GeminiAugmenter::new(&config_for("http://127.0.0.1:9/v1/models")).unwrap();
        assert!(!augmenter.has_credential());
        assert_eq!(
            augmenter.augment("anything"),
            Augmentation::Unavailable(UnavailableReason::MissingCredential(
                "CURATOR_TEST_UNSET_KEY_VAR".to_string()
            ))
        );
    }

    #[test]
    fn test_unreachable_service_is_transport_failure() {
        let augmenter = GeminiAugmenter::new(&config_for("http://127.0.0.1:9/v1/models"))
            .unwrap()
            .with_api_key("k");
        assert!(matches!(
            augmenter.augment("q"),
            Augmentation::Unavailable(UnavailableReason::Transport(_))
        ));
    }

    #[test]
    fn test_error_status() {
        let (_runtime, server) =
            mock_gemini(ResponseTemplate::new(403).set_body_string(r#"{"error": "denied"}"#));

        match augmenter_for(&server).augment("q") {
            Augmentation::Unavailable(UnavailableReason::Status { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("denied"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_envelope_without_text() {
        let (_runtime, server) = mock_gemini(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        );
        assert!(matches!(
            augmenter_for(&server).augment("q"),
            Augmentation::Unavailable(UnavailableReason::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_non_json_model_output() {
        let (_runtime, server) = mock_gemini(envelope("Sorry, I can't."));
        assert_eq!(
            augmenter_for(&server).augment("q"),
            Augmentation::Unavailable(UnavailableReason::NoJsonObject)
        );
    }

    #[test]
    fn test_wrong_shape_model_output() {
        let (_runtime, server) = mock_gemini(envelope("{\"a\": \"b\"}"));
        assert!(matches!(
            augmenter_for(&server).augment("q"),
            Augmentation::Unavailable(UnavailableReason::InvalidShape(_))
        ));
    }

    #[test]
    fn test_duplicate_keyword_in_model_output() {
        let (_runtime, server) = mock_gemini(envelope("{\"a\": [\"x\"], \"a\": [\"y\"]}"));
        assert!(matches!(
            augmenter_for(&server).augment("q"),
            Augmentation::Unavailable(UnavailableReason::InvalidShape(_))
        ));
    }
}
