//! Key-phrase extraction collaborator.
//!
//! The heading classifier uses key phrases as a last-resort signal; callers
//! treat any failure here as "no key phrases", so the HTTP implementation
//! reports errors faithfully and leaves the fail-open decision upstream.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum KeyPhraseError {
    #[error("key-phrase request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("key-phrase endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("key-phrase response carried no document results")]
    EmptyResponse,
}

/// Key-phrase extraction capability.
#[async_trait]
pub trait KeyPhraseExtractor: Send + Sync {
    async fn key_phrases(&self, text: &str, language: &str)
    -> Result<Vec<String>, KeyPhraseError>;
}

/// HTTP client for text-analytics style key-phrase endpoints.
///
/// Posts a single-document envelope and returns the phrases of the first
/// (only) result.
pub struct HttpKeyPhraseExtractor {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpKeyPhraseExtractor {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.into(),
        }
    }

    /// Replaces the HTTP client, e.g. to share a pooled instance.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl KeyPhraseExtractor for HttpKeyPhraseExtractor {
    async fn key_phrases(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Vec<String>, KeyPhraseError> {
        let request = KeyPhraseRequest {
            documents: vec![DocumentInput {
                id: "1",
                language,
                text,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeyPhraseError::Status { status, body });
        }

        let mut parsed: KeyPhraseResponse = response.json().await?;
        if parsed.documents.is_empty() {
            return Err(KeyPhraseError::EmptyResponse);
        }
        Ok(parsed.documents.swap_remove(0).key_phrases)
    }
}

#[derive(Serialize)]
struct KeyPhraseRequest<'a> {
    documents: Vec<DocumentInput<'a>>,
}

#[derive(Serialize)]
struct DocumentInput<'a> {
    id: &'a str,
    language: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct KeyPhraseResponse {
    documents: Vec<DocumentResult>,
}

#[derive(Deserialize)]
struct DocumentResult {
    #[serde(rename = "keyPhrases")]
    key_phrases: Vec<String>,
}

/// Canned extractor for tests and offline runs.
pub struct MockKeyPhraseExtractor {
    phrases: Vec<String>,
    fail: bool,
}

impl MockKeyPhraseExtractor {
    /// Returns the same phrase list for every input.
    pub fn returning(phrases: Vec<String>) -> Self {
        Self {
            phrases,
            fail: false,
        }
    }

    /// Fails every call, for exercising fail-open behavior.
    pub fn failing() -> Self {
        Self {
            phrases: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl KeyPhraseExtractor for MockKeyPhraseExtractor {
    async fn key_phrases(
        &self,
        _text: &str,
        _language: &str,
    ) -> Result<Vec<String>, KeyPhraseError> {
        if self.fail {
            return Err(KeyPhraseError::EmptyResponse);
        }
        Ok(self.phrases.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn parses_first_document_phrases() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/keyphrases")
                    .header("api-key", "secret")
                    .json_body_partial(r#"{"documents": [{"id": "1", "language": "es"}]}"#);
                then.status(200).json_body(json!({
                    "documents": [{"id": "1", "keyPhrases": ["Sistemas distribuidos"]}]
                }));
            })
            .await;

        let endpoint = Url::parse(&server.url("/keyphrases")).unwrap();
        let extractor = HttpKeyPhraseExtractor::new(endpoint, "secret");
        let phrases = extractor
            .key_phrases("Sistemas distribuidos", "es")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(phrases, vec!["Sistemas distribuidos".to_string()]);
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/keyphrases");
                then.status(429).body("throttled");
            })
            .await;

        let endpoint = Url::parse(&server.url("/keyphrases")).unwrap();
        let extractor = HttpKeyPhraseExtractor::new(endpoint, "secret");
        let err = extractor.key_phrases("some text", "es").await.unwrap_err();
        match err {
            KeyPhraseError::Status { status, body } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "throttled");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
