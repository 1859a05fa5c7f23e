//! Clients for OpenAI-compatible HTTP APIs.
//!
//! The same wire format serves the main chat model, the research service
//! (Perplexity speaks `/chat/completions` too) and document embeddings.
//! Each client keeps one `reqwest::Client` for connection pooling.

use std::time::Duration;

use async_trait::async_trait;
use concierge_data::{DataError, Embedder};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};

/// Inputs per embeddings request.
const EMBEDDING_BATCH: usize = 128;

fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Chat completions client.
pub struct OpenAiChat {
    client: Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiChat {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            client: http_client()?,
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            timeout,
        })
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        let url = endpoint(&self.base_url, "chat/completions");
        let body = self.build_request(request);
        debug!(service = %self.name, model = %self.model, json_mode = request.json_mode, "Calling chat completions");

        let response = tokio::time::timeout(self.timeout, async {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
        })
        .await
        .map_err(|_| AgentError::Timeout(self.timeout.as_secs()))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(service = %self.name, status = status.as_u16(), "Chat completion failed");
            return Err(AgentError::Service {
                service: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::Parse(format!("{} returned no content", self.name)))
    }
}

/// Embeddings client for building and querying the semantic index.
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DataError> {
        let url = endpoint(&self.base_url, "embeddings");
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = tokio::time::timeout(self.timeout, async {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
        })
        .await
        .map_err(|_| {
            DataError::Embedding(format!("timed out after {} seconds", self.timeout.as_secs()))
        })?
        .map_err(|e| DataError::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::Embedding(format!(
                "embeddings returned {}: {body}",
                status.as_u16()
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DataError::Embedding(e.to_string()))?;
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DataError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!(inputs = texts.len(), model = %self.model, "Embedded texts");
        Ok(vectors)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
