// HTTP inference backend (OpenAI-compatible chat completions, no SDK)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::streaming::parse_sse_stream;
use crate::traits::{FragmentStream, GenerateRequest, InferenceClient};

/// Generation latency is large and variable, so the read bound is much
/// longer than the connect bound. A timeout on either surfaces as a failed
/// generate call, never a silent hang.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Inference client that routes to an OpenAI-compatible
/// `/v1/chat/completions` endpoint.
pub struct HttpInferenceClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpInferenceClient {
    /// Create a client with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }

    /// Create a client with explicit connect and read bounds.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_payload(&self, request: &GenerateRequest, stream: bool) -> Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "stream": stream,
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let endpoint = self.endpoint();
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending inference request to {}",
            endpoint
        );

        let response = self
            .http_client
            .post(&endpoint)
            .json(&self.build_payload(&request, false))
            .send()
            .await
            .with_context(|| format!("Cannot reach inference backend at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference backend returned {}: {}", status, body);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Invalid response from inference backend")?;

        let content = completion.content().unwrap_or_default();
        tracing::debug!("Received completion ({} chars)", content.len());
        Ok(content)
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<FragmentStream> {
        let endpoint = self.endpoint();
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Opening inference stream to {}",
            endpoint
        );

        let response = self
            .http_client
            .post(&endpoint)
            .json(&self.build_payload(&request, true))
            .send()
            .await
            .with_context(|| format!("Cannot reach inference backend at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference backend returned {}: {}", status, body);
        }

        Ok(parse_sse_stream(response))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}
