//! Gemini `generateContent` client.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use polaroid_common::config::CaptionDefaults;
use polaroid_common::error::{PolaroidError, PolaroidResult};
use polaroid_model::CapturedImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::provider::CaptionProvider;

/// Captions from a Gemini vision model.
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> PolaroidResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PolaroidError::caption(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a provider from config. `None` when no credential is set.
    pub fn from_defaults(caption: &CaptionDefaults) -> PolaroidResult<Option<Self>> {
        let Some(api_key) = caption.api_key() else {
            return Ok(None);
        };
        Self::new(
            caption.endpoint.clone(),
            caption.model.clone(),
            api_key,
            Duration::from_secs(caption.timeout_secs),
        )
        .map(Some)
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl CaptionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, image: &CapturedImage, prompt: &str) -> PolaroidResult<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type(),
                            data: general_purpose::STANDARD.encode(image.bytes()),
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
        };

        tracing::debug!(model = %self.model, bytes = image.bytes().len(), "Requesting caption");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PolaroidError::caption(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PolaroidError::caption(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PolaroidError::caption(format!("Invalid Gemini response: {e}")))?;
        response_text(parsed)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Concatenated text parts of the first candidate, trimmed.
fn response_text(response: GenerateResponse) -> PolaroidResult<String> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(PolaroidError::caption(format!(
            "Gemini blocked the prompt: {reason}"
        )));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(PolaroidError::caption("Gemini returned no text"));
    }
    Ok(text.to_string())
}
