// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local embedding service speaking Ollama's `/api/embed` protocol.

use std::time::Duration;

use async_trait::async_trait;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    RecallError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, into_output, map_request_err};

const PROVIDER: &str = "ollama";

/// Embedding adapter for a local Ollama-compatible server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, RecallError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl PluginAdapter for OllamaEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        match self.client.get(self.endpoint("/api/tags")).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Unhealthy(format!(
                "{PROVIDER} returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("{PROVIDER} unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: 0,
            });
        }

        let request = EmbedRequest {
            model: &self.model,
            input: &input.texts,
        };
        let response = self
            .client
            .post(self.endpoint("/api/embed"))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_err(e, PROVIDER, self.timeout))?;

        let status = response.status();
        debug!(status = %status, count = input.texts.len(), "embedding response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecallError::embedding(format!(
                "{PROVIDER} returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| map_request_err(e, PROVIDER, self.timeout))?;
        into_output(parsed.embeddings, input.texts.len(), PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(url: &str) -> OllamaEmbedder {
        OllamaEmbedder::new(url, "nomic-embed-text", Duration::from_secs(5)).unwrap()
    }

    fn input(texts: &[&str]) -> EmbeddingInput {
        EmbeddingInput {
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn embed_posts_batch_and_parses_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({
                "model": "nomic-embed-text",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = embedder(&server.uri())
            .embed(input(&["first", "second"]))
            .await
            .unwrap();
        assert_eq!(output.dimensions, 3);
        assert_eq!(output.embeddings[1], vec![0.4, 0.5, 0.6]);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[1.0, 0.0]]})),
            )
            .mount(&server)
            .await;

        let url = format!("{}/", server.uri());
        let output = embedder(&url).embed(input(&["x"])).await.unwrap();
        assert_eq!(output.embeddings.len(), 1);
    }

    #[tokio::test]
    async fn server_error_is_an_embedding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let err = embedder(&server.uri()).embed(input(&["x"])).await.unwrap_err();
        assert!(err.is_embedding_failure());
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_embedding_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"oops": 1})))
            .mount(&server)
            .await;

        let err = embedder(&server.uri()).embed(input(&["x"])).await.unwrap_err();
        assert!(err.is_embedding_failure());
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[1.0]]}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let embedder =
            OllamaEmbedder::new(&server.uri(), "m", Duration::from_millis(50)).unwrap();
        let err = embedder.embed(input(&["x"])).await.unwrap_err();
        assert!(matches!(err, RecallError::Timeout { .. }));
    }

    #[tokio::test]
    async fn empty_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let output = embedder(&server.uri()).embed(input(&[])).await.unwrap();
        assert!(output.embeddings.is_empty());
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_server() {
        let embedder = embedder("http://127.0.0.1:9");
        let status = embedder.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
