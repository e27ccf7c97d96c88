//! Ollama embedding and generation providers using the Ollama HTTP API.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;

/// The default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Connection settings shared by both Ollama providers.
#[derive(Debug, Clone)]
struct OllamaEndpoint {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEndpoint {
    fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// POST `body` to `path` and decode a successful JSON response.
    ///
    /// Failures are returned as a plain message; callers wrap them in the
    /// error variant for their capability.
    async fn post<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json::<R>().await.map_err(|e| format!("failed to parse response: {e}"))
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by a local Ollama server.
///
/// Uses the batch `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use local_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("nomic-embed-text");
/// let embedding = provider.embed("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    endpoint: OllamaEndpoint,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model` on the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self { endpoint: OllamaEndpoint::new(model) }
    }

    /// Point the provider at a different Ollama server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (proxies, TLS settings, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint.client = client;
        self
    }

    fn error(&self, message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: "Ollama".into(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| self.error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Ollama",
            batch_size = texts.len(),
            model = %self.endpoint.model,
            "embedding batch"
        );

        let request = EmbedRequest { model: &self.endpoint.model, input: texts.to_vec() };
        let response: EmbedResponse =
            self.endpoint.post("api/embed", &request).await.map_err(|message| {
                error!(provider = "Ollama", error = %message, "embedding request failed");
                self.error(message)
            })?;

        if response.embeddings.len() != texts.len() {
            return Err(self.error(format!(
                "expected {} embeddings but Ollama returned {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

// ── Generation ─────────────────────────────────────────────────────

/// A [`GenerationProvider`] backed by a local Ollama server.
///
/// Uses the non-streaming `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerationProvider {
    endpoint: OllamaEndpoint,
}

impl OllamaGenerationProvider {
    /// Create a provider for `model` on the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self { endpoint: OllamaEndpoint::new(model) }
    }

    /// Point the provider at a different Ollama server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (proxies, TLS settings, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint.client = client;
        self
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerationProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = "Ollama",
            model = %self.endpoint.model,
            prompt_len = prompt.len(),
            "generating"
        );

        let request = GenerateRequest { model: &self.endpoint.model, prompt, stream: false };
        let response: GenerateResponse =
            self.endpoint.post("api/generate", &request).await.map_err(|message| {
                error!(provider = "Ollama", error = %message, "generation request failed");
                RagError::GenerationError { provider: "Ollama".into(), message }
            })?;

        Ok(response.response)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls_without_double_slashes() {
        let provider =
            OllamaEmbeddingProvider::new("llama2").with_base_url("http://gpu-box:11434/");
        assert_eq!(provider.endpoint.url("api/embed"), "http://gpu-box:11434/api/embed");
        assert_eq!(
            OllamaGenerationProvider::new("llama2").endpoint.url("api/generate"),
            "http://localhost:11434/api/generate"
        );
    }

    #[test]
    fn builder_methods_keep_the_model() {
        let provider = OllamaGenerationProvider::new("mistral")
            .with_client(reqwest::Client::new())
            .with_base_url("http://10.0.0.2:11434");
        assert_eq!(provider.endpoint.model, "mistral");
        assert_eq!(provider.endpoint.url("api/generate"), "http://10.0.0.2:11434/api/generate");
    }

    #[test]
    fn serializes_non_streaming_generate_request() {
        let request = GenerateRequest { model: "llama2", prompt: "hi", stream: false };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"model": "llama2", "prompt": "hi", "stream": false}));
    }

    #[test]
    fn parses_embed_response() {
        let body = r#"{"model":"llama2","embeddings":[[0.1,0.2],[0.3,0.4]]}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embeddings, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn unreachable_server_is_an_embedding_error() {
        let provider = OllamaEmbeddingProvider::new("llama2").with_base_url("http://127.0.0.1:1");
        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { provider, .. } if provider == "Ollama"));
    }
}
