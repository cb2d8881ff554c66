//! Ollama API client for non-streaming text generation.
//!
//! This module talks to a local Ollama-compatible inference service over
//! HTTP: `/api/generate` for one-shot generation and `/api/tags` for the
//! model inventory. Latency is measured around the round trip and token
//! throughput is derived when the service omits it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::result::{derive_eval_rate, round_hundredths, ModelOutcome, ModelResult};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Matches an embedded reasoning segment, tags included. Non-greedy, with
/// `.` crossing newlines.
const THINK_BLOCK_PATTERN: &str = r"(?s)<think>.*?</think>";

/// Configuration for the Ollama client.
#[derive(Debug)]
pub struct OllamaConfig {
    /// Base URL of the inference service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// Strip `<think>...</think>` reasoning segments from responses before
    /// counting tokens.
    pub strip_reasoning: bool,
}

/// Client for a local Ollama-compatible inference service.
///
/// The client uses `Arc` internally for configuration, making cloning cheap.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Shared configuration wrapped in Arc for cheap cloning.
    pub config: Arc<OllamaConfig>,
    /// HTTP client for making requests.
    pub client: Client,
    think_block: Regex,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
    eval_count: Option<u64>,
    eval_rate: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize, Debug)]
struct OllamaModelTag {
    name: String,
}

/// Trait for anything that can answer one prompt with one named model.
///
/// The fan-out coordinator depends on this seam rather than on the concrete
/// client. `query` is total: transport and service failures come back as a
/// failure-tagged [`ModelResult`], never as an error.
#[async_trait]
pub trait GenerateProvider: Send + Sync {
    async fn query(&self, model: &str, prompt: &str) -> ModelResult;
}

impl OllamaClient {
    /// Creates a new client. `base_url` defaults to the local Ollama address.
    pub fn new(
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
        strip_reasoning: bool,
    ) -> Self {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(sec));
        }
        Self::with_client(
            builder.build().expect("Failed to build reqwest Client"),
            base_url,
            timeout_seconds,
            strip_reasoning,
        )
    }

    /// Creates a new client with a custom HTTP client.
    pub fn with_client(
        client: Client,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
        strip_reasoning: bool,
    ) -> Self {
        Self {
            config: Arc::new(OllamaConfig {
                base_url: base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                timeout_seconds,
                strip_reasoning,
            }),
            client,
            think_block: Regex::new(THINK_BLOCK_PATTERN).expect("valid reasoning pattern"),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.config.timeout_seconds
    }

    pub fn strip_reasoning(&self) -> bool {
        self.config.strip_reasoning
    }

    /// Sends one non-streaming generation request and normalizes the
    /// response.
    ///
    /// The duration covers the full round trip, rounded to hundredths of a
    /// second. `eval_count` falls back to a whitespace token count of the
    /// normalized text when the service omits it, and `eval_rate` falls back
    /// to `eval_count / duration`; service-reported values take precedence.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<ModelOutcome, ClientError> {
        if model.is_empty() {
            return Err(ClientError::InvalidRequest(
                "model identifier must not be empty".to_string(),
            ));
        }

        let body = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("Ollama request payload: {}", json);
            }
        }

        let start = Instant::now();

        let mut request = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body);

        if let Some(timeout) = self.config.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let resp = request.send().await?;

        log::debug!("Ollama HTTP status: {}", resp.status());

        let resp = resp.error_for_status()?;
        let raw = resp.text().await?;
        let json_resp: OllamaGenerateResponse =
            serde_json::from_str(&raw).map_err(|e| ClientError::ResponseFormatError {
                message: format!("Failed to decode Ollama generate response: {e}"),
                raw_response: raw,
            })?;

        let duration = round_hundredths(start.elapsed().as_secs_f64());
        let text = self.normalize(json_resp.response);
        let eval_count = json_resp
            .eval_count
            .unwrap_or_else(|| text.split_whitespace().count() as u64);
        let eval_rate = json_resp
            .eval_rate
            .unwrap_or_else(|| derive_eval_rate(eval_count, duration));

        Ok(ModelOutcome::Success {
            duration,
            eval_count,
            eval_rate,
            text,
        })
    }

    /// Lists the model identifiers the inference service has available.
    pub async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let mut request = self.client.get(format!("{}/api/tags", self.config.base_url));

        if let Some(timeout) = self.config.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let resp = request.send().await?.error_for_status()?;

        let tags: OllamaTagsResponse = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn normalize(&self, raw: String) -> String {
        let text = if self.config.strip_reasoning {
            self.think_block.replace_all(&raw, "").into_owned()
        } else {
            raw
        };
        text.trim().to_string()
    }
}

#[async_trait]
impl GenerateProvider for OllamaClient {
    async fn query(&self, model: &str, prompt: &str) -> ModelResult {
        match self.generate(model, prompt).await {
            Ok(outcome) => ModelResult {
                model: model.to_string(),
                outcome,
            },
            Err(err) => {
                log::warn!("generation failed for model {model}: {err}");
                ModelResult::failure(model, format!("{model}: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard, strip_reasoning: bool) -> OllamaClient {
        OllamaClient::new(Some(server.url()), None, strip_reasoning)
    }

    #[tokio::test]
    async fn generate_uses_service_reported_metrics() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "the sky is blue", "eval_count": 50, "eval_rate": 40.5}"#)
            .create_async()
            .await;

        let client = client_for(&server, false);
        let result = client.query("llama3.2", "why?").await;

        mock.assert_async().await;
        assert_eq!(result.model, "llama3.2");
        assert!(!result.is_failure());
        assert_eq!(result.eval_count(), 50);
        assert_eq!(result.eval_rate(), 40.5);
        assert_eq!(result.display_text(), "the sky is blue");
    }

    #[tokio::test]
    async fn generate_falls_back_to_whitespace_token_count() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "  one two three  "}"#)
            .create_async()
            .await;

        let client = client_for(&server, false);
        let result = client.query("mistral", "count").await;

        assert!(!result.is_failure());
        assert_eq!(result.eval_count(), 3);
        assert_eq!(result.display_text(), "one two three");
    }

    #[tokio::test]
    async fn reasoning_segment_is_stripped_when_enabled() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"response": "<think>step one\nstep two</think>final answer"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, true);
        let result = client.query("qwen3", "solve").await;

        assert_eq!(result.display_text(), "final answer");
        assert_eq!(result.eval_count(), 2);
    }

    #[tokio::test]
    async fn reasoning_segment_is_kept_when_disabled() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "<think>hm</think>answer"}"#)
            .create_async()
            .await;

        let client = client_for(&server, false);
        let result = client.query("qwen3", "solve").await;

        assert_eq!(result.display_text(), "<think>hm</think>answer");
    }

    #[tokio::test]
    async fn non_success_status_becomes_a_captured_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let client = client_for(&server, false);
        let result = client.query("llama3.2", "hi").await;

        assert!(result.is_failure());
        assert_eq!(result.model, "llama3.2");
        assert_eq!(result.duration(), 0.0);
        assert_eq!(result.eval_count(), 0);
        assert_eq!(result.eval_rate(), 0.0);
        let text = result.display_text();
        assert!(text.starts_with("Error: "), "unexpected text: {text}");
        assert!(text.contains("llama3.2"), "missing model context: {text}");
    }

    #[tokio::test]
    async fn malformed_payload_becomes_a_captured_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json at all")
            .create_async()
            .await;

        let client = client_for(&server, false);
        let result = client.query("mistral", "hi").await;

        assert!(result.is_failure());
        assert_eq!(result.duration(), 0.0);
    }

    #[tokio::test]
    async fn unreachable_service_becomes_a_captured_failure() {
        // Nothing listens on this port.
        let client = OllamaClient::new(Some("http://127.0.0.1:1".to_string()), None, false);
        let result = client.query("llama3.2", "hi").await;

        assert!(result.is_failure());
        assert!(result.display_text().starts_with("Error: "));
    }

    #[tokio::test]
    async fn configured_timeout_is_honored_with_an_injected_client() {
        // A bound listener that never accepts: the connection completes but
        // no response ever arrives, so only the configured timeout can end
        // the call.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let client = OllamaClient::with_client(
            reqwest::Client::new(),
            Some(format!("http://{addr}")),
            Some(1),
            false,
        );
        let result = client.query("llama3.2", "hi").await;

        assert!(result.is_failure());
        assert!(result.display_text().starts_with("Error: "));
    }

    #[tokio::test]
    async fn empty_model_identifier_is_rejected() {
        let client = OllamaClient::new(Some("http://127.0.0.1:1".to_string()), None, false);
        let err = client.generate("", "hi").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn list_models_returns_the_inventory() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models": [{"name": "llama3.2"}, {"name": "mistral"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, false);
        let models = client.list_models().await.expect("list models");
        assert_eq!(models, vec!["llama3.2".to_string(), "mistral".to_string()]);
    }

    #[tokio::test]
    async fn list_models_propagates_service_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server, false);
        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, ClientError::HttpError(_)));
    }
}
