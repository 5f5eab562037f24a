// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-first embedding lookups backed by the storage adapter.
//!
//! Vectors are keyed by the content hash of the trimmed text, so identical
//! text is embedded once no matter which scope it is saved into. An entry
//! produced by a different model is treated as a miss and overwritten.

use std::collections::HashMap;
use std::sync::Arc;

use recall_core::types::{TIMESTAMP_FORMAT, now_timestamp};
use recall_core::{EmbeddingAdapter, EmbeddingCacheEntry, EmbeddingInput, RecallError, StorageAdapter};
use tracing::{debug, warn};

use crate::hash::content_hash;

/// Wraps the active embedding provider with the persistent cache.
pub struct CachedEmbedder {
    adapter: Arc<dyn EmbeddingAdapter>,
    storage: Arc<dyn StorageAdapter>,
    max_entries: Option<usize>,
    max_age_days: Option<u32>,
}

impl CachedEmbedder {
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            adapter,
            storage,
            max_entries: None,
            max_age_days: None,
        }
    }

    /// Bound the cache; eviction runs after every batch that wrote entries.
    pub fn with_eviction(mut self, max_entries: Option<usize>, max_age_days: Option<u32>) -> Self {
        self.max_entries = max_entries;
        self.max_age_days = max_age_days;
        self
    }

    /// The wrapped provider.
    pub fn adapter(&self) -> &dyn EmbeddingAdapter {
        self.adapter.as_ref()
    }

    /// Identifier of the underlying provider (e.g. `"ollama"`).
    pub fn provider_id(&self) -> &str {
        self.adapter.name()
    }

    pub fn model(&self) -> &str {
        self.adapter.model()
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| RecallError::embedding("empty embedding response"))
    }

    /// Embed a batch, answering from the cache where possible. Misses are
    /// sent to the provider in a single request, deduplicated by hash.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RecallError> {
        let hashes: Vec<String> = texts.iter().map(|t| content_hash(t)).collect();
        let model = self.adapter.model().to_string();

        let mut resolved: HashMap<String, Vec<f32>> = HashMap::new();
        let mut misses: Vec<(String, String)> = Vec::new();
        let mut hits = 0u64;

        for (text, hash) in texts.iter().zip(&hashes) {
            if resolved.contains_key(hash) || misses.iter().any(|(h, _)| h == hash) {
                continue;
            }
            match self.storage.get_cached_embedding(hash).await? {
                Some(entry) if entry.model == model => {
                    hits += 1;
                    resolved.insert(hash.clone(), entry.embedding);
                }
                Some(entry) => {
                    debug!(hash = %hash, cached = %entry.model, current = %model, "stale cache entry");
                    misses.push((hash.clone(), text.clone()));
                }
                None => misses.push((hash.clone(), text.clone())),
            }
        }

        metrics::counter!("recall_embedding_cache_hits_total").increment(hits);
        metrics::counter!("recall_embedding_cache_misses_total").increment(misses.len() as u64);

        if !misses.is_empty() {
            let input = EmbeddingInput {
                texts: misses.iter().map(|(_, t)| t.clone()).collect(),
            };
            let output = match self.adapter.embed(input).await {
                Ok(output) => output,
                Err(e) => {
                    metrics::counter!("recall_embedding_failures_total").increment(1);
                    return Err(e);
                }
            };
            if output.embeddings.len() != misses.len() {
                metrics::counter!("recall_embedding_failures_total").increment(1);
                return Err(RecallError::embedding(format!(
                    "{} returned {} embeddings for {} inputs",
                    self.adapter.name(),
                    output.embeddings.len(),
                    misses.len()
                )));
            }

            let updated_at = now_timestamp();
            for ((hash, _), embedding) in misses.into_iter().zip(output.embeddings) {
                let entry = EmbeddingCacheEntry {
                    hash: hash.clone(),
                    dims: embedding.len(),
                    embedding,
                    model: model.clone(),
                    updated_at: updated_at.clone(),
                };
                self.storage.put_cached_embedding(&entry).await?;
                resolved.insert(hash, entry.embedding);
            }

            if let Err(e) = self.evict().await {
                warn!(error = %e, "embedding cache eviction failed");
            }
        }

        hashes
            .iter()
            .map(|h| {
                resolved
                    .get(h)
                    .cloned()
                    .ok_or_else(|| RecallError::Internal(format!("unresolved embedding {h}")))
            })
            .collect()
    }

    /// Apply the configured bounds now. Returns the number of entries removed.
    pub async fn evict(&self) -> Result<usize, RecallError> {
        evict_with_bounds(self.storage.as_ref(), self.max_entries, self.max_age_days).await
    }
}

/// Evict cache entries older than `max_age_days`, then any beyond `max_entries`.
pub async fn evict_with_bounds(
    storage: &dyn StorageAdapter,
    max_entries: Option<usize>,
    max_age_days: Option<u32>,
) -> Result<usize, RecallError> {
    if max_entries.is_none() && max_age_days.is_none() {
        return Ok(0);
    }
    let cutoff = max_age_days.map(|days| {
        (chrono::Utc::now() - chrono::Duration::days(i64::from(days)))
            .format(TIMESTAMP_FORMAT)
            .to_string()
    });
    let removed = storage
        .evict_cached_embeddings(max_entries, cutoff.as_deref())
        .await?;
    if removed > 0 {
        debug!(removed, "evicted embedding cache entries");
    }
    Ok(removed)
}
