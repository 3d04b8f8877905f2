/// LLM Client — the single point of entry for text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call an inference endpoint directly.
/// Handlers hold an `Arc<dyn TextGenerator>` and never see URLs or credentials.
///
/// Backends speak the Hugging Face text-generation format:
/// request `{ inputs, parameters }`, response `[{ generated_text }]`,
/// `{ generated_text }`, or `{ error }`.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub do_sample: bool,
    /// `false` asks the endpoint not to echo the prompt back.
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 1024,
            temperature: 0.7,
            top_p: 0.95,
            do_sample: true,
            return_full_text: false,
        }
    }
}

/// Text produced by a backend, tagged with the backend's name.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub backend: String,
}

impl Generation {
    /// The generated text with an echoed prompt removed, when the endpoint echoed it.
    pub fn continuation(&self, prompt: &str) -> &str {
        self.text.strip_prefix(prompt).unwrap_or(&self.text)
    }
}

/// A text-generation backend. Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<Generation, LlmError>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
    Error { error: String },
}

/// Extracts the generated text from any of the endpoint's response shapes.
fn parse_generated_text(body: &str) -> Result<String, LlmError> {
    let text = match serde_json::from_str::<InferenceResponse>(body)? {
        InferenceResponse::Batch(items) => items
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .unwrap_or_default(),
        InferenceResponse::Single(g) => g.generated_text,
        InferenceResponse::Error { error } => {
            return Err(LlmError::Api {
                status: 200,
                message: error,
            })
        }
    };

    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text)
}

/// Exponential backoff: 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt.saturating_sub(1)).min(6)))
}

/// Client for one Hugging Face-compatible inference endpoint.
/// Retries on 429 (rate limit / model loading) and 5xx with exponential backoff.
#[derive(Clone)]
pub struct HuggingFaceClient {
    client: Client,
    name: String,
    url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl HuggingFaceClient {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        api_key: Option<String>,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            name: name.into(),
            url: url.into(),
            api_key,
            max_retries: max_retries.max(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, LlmError> {
        let request_body = InferenceRequest {
            inputs: prompt,
            parameters: params,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "{} call attempt {} failed, retrying after {}ms...",
                    self.name,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.url).json(&request_body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("{} returned {}: {}", self.name, status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let text = parse_generated_text(&body)?;
            debug!(
                "{} call succeeded: prompt_chars={}, output_chars={}",
                self.name,
                prompt.len(),
                text.len()
            );

            return Ok(Generation {
                text,
                backend: self.name.clone(),
            });
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Tries the primary backend, then the fallback (if configured) when it fails.
pub struct FallbackGenerator {
    primary: Arc<dyn TextGenerator>,
    fallback: Option<Arc<dyn TextGenerator>>,
}

impl FallbackGenerator {
    pub fn new(primary: Arc<dyn TextGenerator>, fallback: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl TextGenerator for FallbackGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, LlmError> {
        match self.primary.generate(prompt, params).await {
            Ok(generation) => Ok(generation),
            Err(primary_error) => match &self.fallback {
                Some(fallback) => {
                    warn!("Primary inference failed, falling back: {primary_error}");
                    fallback.generate(prompt, params).await
                }
                None => Err(primary_error),
            },
        }
    }
}
