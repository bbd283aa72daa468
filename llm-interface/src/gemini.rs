//! Gemini REST client: content generation plus the model catalog.

use crate::GenerativeModel;
use digest_core::{CoreError, LlmError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Every model the API key can see, following catalog pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, CoreError> {
        let url = format!("{}/models", GEMINI_API_BASE);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", "200")]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request.send().await.map_err(|e| {
                error!("Network error listing Gemini models: {}", e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                error!("Model listing failed with status {}", status);
                let retry_after = retry_after_header(&response);
                return Err(error_for_status(status, retry_after, &self.model));
            }

            let page: ModelList = response.json().await.map_err(|e| {
                error!("Failed to parse model listing: {}", e);
                CoreError::Llm(LlmError::InvalidResponseFormat {
                    provider: PROVIDER.to_string(),
                })
            })?;
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Gemini reports {} available models", models.len());
        Ok(models)
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Requesting completion from {}", self.model);
        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Network error calling Gemini: {}", e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Gemini request failed with status {}", status);
            let retry_after = retry_after_header(&response);
            return Err(error_for_status(status, retry_after, &self.model));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            })
        })?;
        extract_text(body)
    }
}

fn retry_after_header(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

fn error_for_status(status: StatusCode, retry_after: Option<u64>, model: &str) -> CoreError {
    let error = match status.as_u16() {
        429 => LlmError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after: retry_after.unwrap_or(5),
        },
        400 | 401 | 403 => LlmError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        },
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        _ => LlmError::ServiceUnavailable {
            provider: PROVIDER.to_string(),
        },
    };
    error.into()
}

/// Joined candidate text, or the error the response encodes: a blocked
/// prompt or a completion with nothing usable in it.
fn extract_text(response: GenerateResponse) -> Result<String, CoreError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        warn!("Gemini blocked the prompt: {}", reason);
        return Err(LlmError::ContentFiltered {
            reason: reason.to_string(),
        }
        .into());
    }

    let text: String = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .map(|part| part.text.as_str())
        .collect();

    if text.trim().is_empty() {
        let finish_reason = response
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
            .unwrap_or("unknown");
        warn!(
            "Gemini returned no usable text (finish reason: {})",
            finish_reason
        );
        return Err(LlmError::EmptyCompletion {
            details: format!("finish reason: {}", finish_reason),
        }
        .into());
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// One entry from the provider's model catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }

    /// Catalog names come prefixed ("models/gemini-..."); this is the bare id.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}
