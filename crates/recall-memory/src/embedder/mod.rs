// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding providers and the provider selection chain.
//!
//! The backend is chosen once at startup: a local Ollama-compatible
//! service when `embedding.local_url` is set, otherwise the OpenAI-compatible
//! cloud API when `embedding.api_key` is set, otherwise none (keyword-only).

pub mod cache;
pub mod local;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use recall_config::model::EmbeddingConfig;
use recall_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    RecallError,
};
use tracing::info;

pub use cache::CachedEmbedder;
pub use local::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

/// The embedding provider selected for this process.
pub enum EmbeddingBackend {
    Local(OllamaEmbedder),
    Cloud(OpenAiEmbedder),
}

impl EmbeddingBackend {
    /// Resolve the provider chain. `Ok(None)` means keyword-only mode.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Option<Self>, RecallError> {
        if !config.enabled {
            info!("embeddings disabled, keyword-only search");
            return Ok(None);
        }
        let timeout = Duration::from_secs(config.timeout_secs);

        if let Some(url) = &config.local_url {
            info!(url = %url, model = %config.local_model, "using local embedding service");
            return OllamaEmbedder::new(url, &config.local_model, timeout)
                .map(|e| Some(Self::Local(e)));
        }

        if let Some(api_key) = &config.api_key {
            info!(
                base_url = %config.cloud_base_url,
                model = %config.cloud_model,
                "using cloud embedding API"
            );
            return OpenAiEmbedder::new(
                api_key.clone(),
                &config.cloud_base_url,
                &config.cloud_model,
                timeout,
            )
            .map(|e| Some(Self::Cloud(e)));
        }

        info!("no embedding provider configured, keyword-only search");
        Ok(None)
    }
}

#[async_trait]
impl PluginAdapter for EmbeddingBackend {
    fn name(&self) -> &str {
        match self {
            Self::Local(e) => e.name(),
            Self::Cloud(e) => e.name(),
        }
    }

    fn version(&self) -> semver::Version {
        match self {
            Self::Local(e) => e.version(),
            Self::Cloud(e) => e.version(),
        }
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        match self {
            Self::Local(e) => e.health_check().await,
            Self::Cloud(e) => e.health_check().await,
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for EmbeddingBackend {
    fn model(&self) -> &str {
        match self {
            Self::Local(e) => e.model(),
            Self::Cloud(e) => e.model(),
        }
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        match self {
            Self::Local(e) => e.embed(input).await,
            Self::Cloud(e) => e.embed(input).await,
        }
    }
}

/// Build the shared HTTP client with the per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, RecallError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RecallError::Embedding {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Map a transport error, keeping timeouts distinguishable.
pub(crate) fn map_request_err(e: reqwest::Error, provider: &str, timeout: Duration) -> RecallError {
    if e.is_timeout() {
        RecallError::Timeout { duration: timeout }
    } else {
        RecallError::Embedding {
            message: format!("{provider} request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

/// Check that a provider answered with one equally sized vector per input.
pub(crate) fn into_output(
    embeddings: Vec<Vec<f32>>,
    expected: usize,
    provider: &str,
) -> Result<EmbeddingOutput, RecallError> {
    if embeddings.len() != expected {
        return Err(RecallError::embedding(format!(
            "{provider} returned {} embeddings for {expected} inputs",
            embeddings.len()
        )));
    }
    let dimensions = embeddings.first().map_or(0, Vec::len);
    if embeddings.iter().any(|e| e.len() != dimensions || e.is_empty()) {
        return Err(RecallError::embedding(format!(
            "{provider} returned embeddings of inconsistent dimensions"
        )));
    }
    Ok(EmbeddingOutput {
        embeddings,
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_selects_nothing() {
        let config = EmbeddingConfig {
            enabled: false,
            local_url: Some("http://localhost:11434".to_string()),
            ..EmbeddingConfig::default()
        };
        assert!(EmbeddingBackend::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn default_config_is_keyword_only() {
        assert!(
            EmbeddingBackend::from_config(&EmbeddingConfig::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn local_url_wins_over_api_key() {
        let config = EmbeddingConfig {
            local_url: Some("http://localhost:11434".to_string()),
            api_key: Some("sk-test".to_string()),
            ..EmbeddingConfig::default()
        };
        let backend = EmbeddingBackend::from_config(&config).unwrap().unwrap();
        assert!(matches!(backend, EmbeddingBackend::Local(_)));
        assert_eq!(backend.name(), "ollama");
        assert_eq!(backend.model(), "nomic-embed-text");
    }

    #[test]
    fn api_key_selects_cloud() {
        let config = EmbeddingConfig {
            api_key: Some("sk-test".to_string()),
            ..EmbeddingConfig::default()
        };
        let backend = EmbeddingBackend::from_config(&config).unwrap().unwrap();
        assert!(matches!(backend, EmbeddingBackend::Cloud(_)));
        assert_eq!(backend.name(), "openai");
        assert_eq!(backend.model(), "text-embedding-3-small");
    }

    #[test]
    fn output_validation_rejects_count_mismatch() {
        let err = into_output(vec![vec![1.0]], 2, "test").unwrap_err();
        assert!(err.is_embedding_failure());
    }

    #[test]
    fn output_validation_rejects_ragged_vectors() {
        assert!(into_output(vec![vec![1.0, 2.0], vec![1.0]], 2, "test").is_err());
        let ok = into_output(vec![vec![1.0, 2.0], vec![3.0, 4.0]], 2, "test").unwrap();
        assert_eq!(ok.dimensions, 2);
    }
}
