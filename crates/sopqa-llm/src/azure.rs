use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Azure OpenAI client scoped to a single deployment.
///
/// Chat and embedding deployments usually live behind different endpoints and
/// keys, so one instance is built per deployment.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    deployment: String,
    api_version: String,
    temperature: f32,
    max_tokens: u32,
}

impl fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AzureOpenAiProvider {
    #[must_use]
    pub fn new(
        mut endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    ) -> Self {
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            endpoint,
            deployment,
            api_version,
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Sampling parameters used by [`LlmProvider::chat`].
    #[must_use]
    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn deployment_url(&self, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{operation}?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.deployment_url(operation))
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(deployment = %self.deployment, "Azure OpenAI rate limited");
            return Err(LlmError::RateLimited);
        }

        if status.is_server_error() {
            tracing::error!("Azure OpenAI {operation} error {status}: {text}");
            return Err(LlmError::Unavailable);
        }

        if !status.is_success() {
            tracing::error!("Azure OpenAI {operation} error {status}: {text}");
            return Err(LlmError::Other(format!(
                "Azure OpenAI {operation} request failed (status {status})"
            )));
        }

        Ok(text)
    }

    async fn request_embeddings(
        &self,
        input: EmbeddingInput<'_>,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        let text = self.post("embeddings", &EmbeddingRequest { input }).await?;
        let mut resp: EmbeddingResponse = serde_json::from_str(&text)?;
        resp.data.sort_by_key(|d| d.index);
        Ok(resp.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl LlmProvider for AzureOpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_messages: Vec<ApiMessage<'_>> = messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();
        let body = ChatRequest {
            messages: &api_messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let text = self.post("chat/completions", &body).await?;
        let resp: ChatResponse = serde_json::from_str(&text)?;

        if let Some(usage) = resp.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Azure OpenAI usage"
            );
        }

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse {
                provider: "azure-openai",
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.request_embeddings(EmbeddingInput::Single(text))
            .await?
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse {
                provider: "azure-openai",
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request_embeddings(EmbeddingInput::Batch(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(LlmError::BatchMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "azure-openai"
    }
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: EmbeddingInput<'a>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
