// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible embeddings API client.

use std::time::Duration;

use async_trait::async_trait;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    RecallError,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, into_output, map_request_err};

const PROVIDER: &str = "openai";

/// Embedding adapter for `/v1/embeddings` style endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Resolve the embeddings URL from a base URL that may or may not carry a
/// version segment or the `/embeddings` suffix already.
pub(crate) fn embeddings_endpoint(base_url: &str) -> String {
    let normalized = base_url.trim_end_matches('/');
    if normalized.ends_with("/embeddings") {
        return normalized.to_string();
    }
    if has_version_suffix(normalized) {
        return format!("{normalized}/embeddings");
    }
    format!("{normalized}/v1/embeddings")
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, RecallError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: SecretString::from(api_key),
            endpoint: embeddings_endpoint(base_url),
            model: model.to_string(),
            timeout,
        })
    }

    fn models_endpoint(&self) -> String {
        let base = self
            .endpoint
            .strip_suffix("/embeddings")
            .unwrap_or(&self.endpoint);
        format!("{base}/models")
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
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
        let result = self
            .client
            .get(self.models_endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "{PROVIDER} returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("{PROVIDER} unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
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

        let request = EmbeddingRequest {
            model: &self.model,
            input: &input.texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
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

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| map_request_err(e, PROVIDER, self.timeout))?;
        // Entries may arrive out of order; `index` is authoritative when present.
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        let embeddings = parsed.data.into_iter().map(|d| d.embedding).collect();
        into_output(embeddings, input.texts.len(), PROVIDER)
    }
}
