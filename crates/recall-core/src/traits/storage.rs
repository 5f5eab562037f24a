// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the memory store.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingCacheEntry, Fragment, KeywordHit, KnowledgeDoc, RawMessage};

/// Durable storage for fragments, raw messages, knowledge documents and
/// the embedding cache, plus a lexical search primitive.
///
/// The full-text index must stay consistent with fragment inserts and
/// deletes. Every single-row write is atomic on its own.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (connection, migrations).
    async fn initialize(&self) -> Result<(), RecallError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), RecallError>;

    // --- Fragments ---

    /// Inserts a fragment. Returns `false` when `(scope_id, content_hash)`
    /// already exists and nothing was written.
    async fn insert_fragment(&self, fragment: &Fragment) -> Result<bool, RecallError>;

    /// Checks whether a fragment with this hash exists in the scope.
    async fn fragment_exists(&self, scope_id: &str, content_hash: &str)
    -> Result<bool, RecallError>;

    /// Full-text search within one scope. `fts_query` is an FTS5 MATCH expression.
    async fn keyword_search(
        &self,
        scope_id: &str,
        fts_query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>, RecallError>;

    /// All fragments in the scope that carry an embedding.
    async fn fragments_with_embeddings(&self, scope_id: &str)
    -> Result<Vec<Fragment>, RecallError>;

    /// Fragments (any scope) stored without an embedding, oldest first.
    async fn fragments_missing_embeddings(&self, limit: usize)
    -> Result<Vec<Fragment>, RecallError>;

    /// Records an embedding for a fragment that has none. Returns `false`
    /// when the fragment is gone or already embedded.
    async fn set_fragment_embedding(
        &self,
        id: &str,
        embedding: &[f32],
        model: &str,
    ) -> Result<bool, RecallError>;

    /// Total number of stored fragments.
    async fn count_fragments(&self) -> Result<usize, RecallError>;

    /// Links a knowledge document to the fragment stored under
    /// `(scope_id, content_hash)`. Returns `false` when the fragment is
    /// missing or already linked.
    async fn link_fragment_doc(
        &self,
        scope_id: &str,
        content_hash: &str,
        doc_id: &str,
    ) -> Result<bool, RecallError>;

    /// Detaches a knowledge document from its fragments, deleting those no
    /// other document links to. Returns the number deleted.
    async fn delete_fragments_for_doc(&self, doc_id: &str) -> Result<usize, RecallError>;

    /// Number of fragments linked to a knowledge document.
    async fn count_doc_fragments(&self, doc_id: &str) -> Result<usize, RecallError>;

    // --- Raw messages ---

    async fn insert_raw_message(&self, message: &RawMessage) -> Result<(), RecallError>;

    /// The most recent `limit` messages of the scope, oldest first.
    async fn load_raw_messages(
        &self,
        scope_id: &str,
        limit: usize,
    ) -> Result<Vec<RawMessage>, RecallError>;

    // --- Knowledge documents ---

    async fn upsert_knowledge_doc(&self, doc: &KnowledgeDoc) -> Result<(), RecallError>;

    async fn get_knowledge_doc(&self, id: &str) -> Result<Option<KnowledgeDoc>, RecallError>;

    async fn list_knowledge_docs(&self) -> Result<Vec<KnowledgeDoc>, RecallError>;

    async fn count_knowledge_docs(&self) -> Result<usize, RecallError>;

    /// Deletes the document row. Returns `false` when it did not exist.
    async fn delete_knowledge_doc(&self, id: &str) -> Result<bool, RecallError>;

    // --- Embedding cache ---

    /// Looks up a cached embedding. Undecodable entries read as `None`.
    async fn get_cached_embedding(
        &self,
        hash: &str,
    ) -> Result<Option<EmbeddingCacheEntry>, RecallError>;

    /// Writes (or overwrites) a cache entry.
    async fn put_cached_embedding(&self, entry: &EmbeddingCacheEntry) -> Result<(), RecallError>;

    async fn count_cached_embeddings(&self) -> Result<usize, RecallError>;

    /// Evicts entries updated before `older_than`, then the least recently
    /// updated entries beyond `max_entries`. Returns the number removed.
    async fn evict_cached_embeddings(
        &self,
        max_entries: Option<usize>,
        older_than: Option<&str>,
    ) -> Result<usize, RecallError>;
}
