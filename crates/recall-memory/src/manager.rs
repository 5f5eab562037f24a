// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory engine facade: save pipeline, search, prompt digest, status,
//! knowledge documents and maintenance.

use std::collections::HashSet;
use std::sync::Arc;

use recall_config::RecallConfig;
use recall_config::model::{EmbeddingConfig, MemoryConfig};
use recall_core::types::now_timestamp;
use recall_core::{
    EmbeddingAdapter, Fragment, FragmentSource, HealthStatus, KNOWLEDGE_SCOPE, KnowledgeDoc,
    PluginAdapter, RawMessage, RecallError, StorageAdapter,
};
use recall_storage::SqliteStorage;
use tracing::{debug, info, warn};

use crate::chunker::{Chunk, chunk_text};
use crate::embedder::cache::evict_with_bounds;
use crate::embedder::{CachedEmbedder, EmbeddingBackend};
use crate::hash::content_hash;
use crate::retriever::HybridRetriever;
use crate::types::{
    AdapterStatus, ChunkOptions, MemoryStatus, SaveReport, SearchOptions, SearchResult,
};

const PROMPT_HEADER: &str = "## Relevant Memories\n";
const TRUNCATION_MARKER: &str = "…\n";

/// Entry point for saving and recalling memories.
///
/// One instance owns the storage handle and the (optional) cached embedder
/// and shares both with its retriever.
pub struct MemoryManager {
    storage: Arc<dyn StorageAdapter>,
    embedder: Option<Arc<CachedEmbedder>>,
    retriever: HybridRetriever,
    config: MemoryConfig,
    cache_max_entries: Option<usize>,
    cache_max_age_days: Option<u32>,
}

impl MemoryManager {
    /// Build a manager over an initialized storage adapter. `adapter = None`
    /// runs keyword-only.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        adapter: Option<Arc<dyn EmbeddingAdapter>>,
        embedding: &EmbeddingConfig,
        config: MemoryConfig,
    ) -> Self {
        let embedder = adapter.map(|adapter| {
            Arc::new(
                CachedEmbedder::new(adapter, storage.clone())
                    .with_eviction(embedding.cache_max_entries, embedding.cache_max_age_days),
            )
        });
        let retriever = HybridRetriever::new(storage.clone(), embedder.clone());
        Self {
            storage,
            embedder,
            retriever,
            config,
            cache_max_entries: embedding.cache_max_entries,
            cache_max_age_days: embedding.cache_max_age_days,
        }
    }

    /// Open the configured SQLite database and resolve the embedding provider.
    pub async fn from_config(config: &RecallConfig) -> Result<Self, RecallError> {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let adapter = EmbeddingBackend::from_config(&config.embedding)?
            .map(|backend| Arc::new(backend) as Arc<dyn EmbeddingAdapter>);
        info!(
            database = %config.storage.database_path,
            keyword_only = adapter.is_none(),
            "memory engine ready"
        );
        Ok(Self::new(
            Arc::new(storage),
            adapter,
            &config.embedding,
            config.memory.clone(),
        ))
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Search defaults from `[memory]`.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::from_config(&self.config)
    }

    pub fn chunk_options(&self) -> ChunkOptions {
        ChunkOptions::from_config(&self.config)
    }

    /// Save a conversation turn or a knowledge snippet with the default chunking.
    pub async fn save(
        &self,
        scope: &str,
        role: &str,
        text: &str,
        source: FragmentSource,
    ) -> Result<SaveReport, RecallError> {
        self.save_with(scope, role, text, source, self.chunk_options())
            .await
    }

    /// Save with explicit chunk geometry.
    ///
    /// The raw message is kept verbatim under `scope`. Fragments go to
    /// `scope`, or to the knowledge scope when `source` is knowledge.
    pub async fn save_with(
        &self,
        scope: &str,
        role: &str,
        text: &str,
        source: FragmentSource,
        options: ChunkOptions,
    ) -> Result<SaveReport, RecallError> {
        if text.trim().is_empty() {
            return Ok(SaveReport::default());
        }

        let message = RawMessage {
            id: uuid::Uuid::new_v4().to_string(),
            scope_id: scope.to_string(),
            role: role.to_string(),
            content: text.to_string(),
            created_at: now_timestamp(),
        };
        self.storage.insert_raw_message(&message).await?;

        let target = if source == FragmentSource::Knowledge {
            KNOWLEDGE_SCOPE
        } else {
            scope
        };
        let report = self.store_chunks(target, text, source, None, options).await?;
        debug!(
            scope = target,
            chunks = report.chunks,
            inserted = report.inserted,
            duplicates = report.duplicates,
            "saved text"
        );
        Ok(report)
    }

    /// Chunk, dedup, embed and insert.
    async fn store_chunks(
        &self,
        scope: &str,
        text: &str,
        source: FragmentSource,
        doc_id: Option<&str>,
        options: ChunkOptions,
    ) -> Result<SaveReport, RecallError> {
        let chunks = chunk_text(text, options);
        let mut report = SaveReport {
            chunks: chunks.len(),
            ..SaveReport::default()
        };

        let mut seen = HashSet::new();
        let mut hashes = Vec::new();
        let mut pending = Vec::new();
        for chunk in chunks {
            let hash = content_hash(&chunk.text);
            if !seen.insert(hash.clone()) {
                report.duplicates += 1;
                continue;
            }
            hashes.push(hash.clone());
            if self.storage.fragment_exists(scope, &hash).await? {
                report.duplicates += 1;
                continue;
            }
            pending.push((chunk, hash));
        }
        if !pending.is_empty() {
            self.insert_chunks(scope, pending, source, doc_id, &mut report)
                .await?;
        }

        // Every chunk of the document is linked, including ones stored earlier.
        if let Some(doc_id) = doc_id {
            for hash in &hashes {
                self.storage.link_fragment_doc(scope, hash, doc_id).await?;
            }
        }
        Ok(report)
    }

    /// Batch-embed new chunks (tolerating provider failure) and insert them.
    async fn insert_chunks(
        &self,
        scope: &str,
        pending: Vec<(Chunk, String)>,
        source: FragmentSource,
        doc_id: Option<&str>,
        report: &mut SaveReport,
    ) -> Result<(), RecallError> {
        let embeddings = match &self.embedder {
            Some(embedder) => {
                let texts: Vec<String> = pending.iter().map(|(c, _)| c.text.clone()).collect();
                match embedder.embed_batch(&texts).await {
                    Ok(vectors) => Some(vectors),
                    Err(e) if e.is_embedding_failure() => {
                        warn!(error = %e, "embedding failed, storing fragments without vectors");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };
        let model = self.embedder.as_ref().map(|e| e.model().to_string());

        let created_at = now_timestamp();
        for (i, (chunk, hash)) in pending.into_iter().enumerate() {
            let embedding = embeddings.as_ref().and_then(|v| v.get(i).cloned());
            let fragment = Fragment {
                id: uuid::Uuid::new_v4().to_string(),
                scope_id: scope.to_string(),
                text: chunk.text,
                content_hash: hash,
                model: embedding.as_ref().and(model.clone()),
                embedding,
                source,
                doc_id: doc_id.map(str::to_string),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                created_at: created_at.clone(),
            };
            if self.storage.insert_fragment(&fragment).await? {
                report.inserted += 1;
                if fragment.embedding.is_some() {
                    report.embedded += 1;
                }
            } else {
                report.duplicates += 1;
            }
        }

        metrics::counter!("recall_fragments_inserted_total").increment(report.inserted as u64);
        Ok(())
    }

    /// Ranked fragments for `query` in `scope`, knowledge included.
    pub async fn search(
        &self,
        query: &str,
        scope: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RecallError> {
        self.retriever.search(query, scope, options).await
    }

    /// Render results as a prompt digest within `memory.prompt_char_budget`.
    pub fn format_for_prompt(&self, results: &[SearchResult]) -> String {
        format_results(results, self.config.prompt_char_budget)
    }

    /// Counts, active provider, and a health check of every adapter.
    pub async fn status(&self) -> Result<MemoryStatus, RecallError> {
        let provider = match &self.embedder {
            Some(embedder) => Some(adapter_status(embedder.adapter()).await),
            None => None,
        };
        Ok(MemoryStatus {
            provider_id: self.embedder.as_ref().map(|e| e.provider_id().to_string()),
            model: self.embedder.as_ref().map(|e| e.model().to_string()),
            search_mode: if self.embedder.is_some() {
                "hybrid".to_string()
            } else {
                "keyword".to_string()
            },
            fragment_count: self.storage.count_fragments().await?,
            cache_count: self.storage.count_cached_embeddings().await?,
            knowledge_doc_count: self.storage.count_knowledge_docs().await?,
            storage: adapter_status(self.storage.as_ref()).await,
            provider,
        })
    }

    // --- Knowledge documents ---

    /// Store a document and expand it into knowledge-scope fragments.
    pub async fn ingest_knowledge(
        &self,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<KnowledgeDoc, RecallError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.store_chunks(
            KNOWLEDGE_SCOPE,
            content,
            FragmentSource::Knowledge,
            Some(&id),
            self.chunk_options(),
        )
        .await?;
        let chunk_count = self.storage.count_doc_fragments(&id).await?;

        let now = now_timestamp();
        let doc = KnowledgeDoc {
            id,
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            chunk_count,
            created_at: now.clone(),
            updated_at: now,
        };
        self.storage.upsert_knowledge_doc(&doc).await?;
        info!(doc_id = %doc.id, title, chunks = doc.chunk_count, "knowledge document ingested");
        Ok(doc)
    }

    /// Replace a document's content, re-expanding its fragments.
    pub async fn update_knowledge(
        &self,
        id: &str,
        title: &str,
        content: &str,
        category: &str,
    ) -> Result<KnowledgeDoc, RecallError> {
        let existing = self.require_doc(id).await?;
        let removed = self.storage.delete_fragments_for_doc(id).await?;
        self.store_chunks(
            KNOWLEDGE_SCOPE,
            content,
            FragmentSource::Knowledge,
            Some(id),
            self.chunk_options(),
        )
        .await?;
        let chunk_count = self.storage.count_doc_fragments(id).await?;

        let doc = KnowledgeDoc {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            chunk_count,
            created_at: existing.created_at,
            updated_at: now_timestamp(),
        };
        self.storage.upsert_knowledge_doc(&doc).await?;
        info!(doc_id = id, removed, chunks = doc.chunk_count, "knowledge document updated");
        Ok(doc)
    }

    /// Delete a document and the fragments no other document shares.
    pub async fn delete_knowledge(&self, id: &str) -> Result<(), RecallError> {
        self.require_doc(id).await?;
        let removed = self.storage.delete_fragments_for_doc(id).await?;
        self.storage.delete_knowledge_doc(id).await?;
        info!(doc_id = id, removed, "knowledge document deleted");
        Ok(())
    }

    pub async fn list_knowledge(&self) -> Result<Vec<KnowledgeDoc>, RecallError> {
        self.storage.list_knowledge_docs().await
    }

    async fn require_doc(&self, id: &str) -> Result<KnowledgeDoc, RecallError> {
        self.storage
            .get_knowledge_doc(id)
            .await?
            .ok_or_else(|| RecallError::NotFound {
                kind: "knowledge doc".to_string(),
                id: id.to_string(),
            })
    }

    // --- History and maintenance ---

    /// The last `limit` raw messages of `scope`, oldest first.
    pub async fn recent_messages(
        &self,
        scope: &str,
        limit: usize,
    ) -> Result<Vec<RawMessage>, RecallError> {
        self.storage.load_raw_messages(scope, limit).await
    }

    /// Embed up to `batch_limit` fragments stored without a vector.
    ///
    /// Returns the number of fragments that received an embedding. Provider
    /// errors are returned to the caller.
    pub async fn backfill_embeddings(&self, batch_limit: usize) -> Result<usize, RecallError> {
        let Some(embedder) = &self.embedder else {
            return Ok(0);
        };
        let fragments = self.storage.fragments_missing_embeddings(batch_limit).await?;
        if fragments.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        let mut updated = 0;
        for (fragment, vector) in fragments.iter().zip(&vectors) {
            if self
                .storage
                .set_fragment_embedding(&fragment.id, vector, embedder.model())
                .await?
            {
                updated += 1;
            }
        }
        info!(updated, "embedding backfill finished");
        Ok(updated)
    }

    /// Apply the configured cache bounds now.
    pub async fn evict_cache(&self) -> Result<usize, RecallError> {
        evict_with_bounds(
            self.storage.as_ref(),
            self.cache_max_entries,
            self.cache_max_age_days,
        )
        .await
    }

    /// Flush and close the store.
    pub async fn close(&self) -> Result<(), RecallError> {
        self.storage.close().await
    }
}

/// A failed health check is reported as unhealthy rather than propagated.
async fn adapter_status<A: PluginAdapter + ?Sized>(adapter: &A) -> AdapterStatus {
    let health = match adapter.health_check().await {
        Ok(health) => health,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    if health != HealthStatus::Healthy {
        warn!(adapter = adapter.name(), %health, "adapter health check failed");
    }
    AdapterStatus {
        kind: adapter.adapter_type(),
        name: adapter.name().to_string(),
        version: adapter.version().to_string(),
        health: health.to_string(),
    }
}

/// Render results as `- [origin/match] text` lines under a header.
///
/// Lines that would overflow `budget` characters are skipped, except the
/// first one, which is cut and marked with `…`. The output never exceeds
/// `budget` characters; a budget too small for the header and the marker
/// yields an empty string.
pub fn format_results(results: &[SearchResult], budget: usize) -> String {
    let header_len = PROMPT_HEADER.chars().count();
    if results.is_empty() || budget < header_len + TRUNCATION_MARKER.chars().count() {
        return String::new();
    }

    let mut out = String::from(PROMPT_HEADER);
    let mut used = header_len;
    let mut written = 0;
    for result in results {
        let text = result.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let line = format!("- [{}/{}] {text}\n", result.origin, result.source);
        let len = line.chars().count();
        if used + len <= budget {
            out.push_str(&line);
            used += len;
            written += 1;
        } else if written == 0 {
            let room = budget - used - TRUNCATION_MARKER.chars().count();
            out.extend(line.chars().take(room));
            out.push_str(TRUNCATION_MARKER);
            used = budget;
            written += 1;
        }
    }
    out
}
