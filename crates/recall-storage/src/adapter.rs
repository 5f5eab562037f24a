// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use recall_config::model::StorageConfig;
use recall_core::{
    AdapterType, EmbeddingCacheEntry, Fragment, HealthStatus, KeywordHit, KnowledgeDoc,
    PluginAdapter, RawMessage, RecallError, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call
/// to [`StorageAdapter::initialize`], unless it was handed in through
/// [`SqliteStorage::from_database`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database. `initialize` becomes an error.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: String::new(),
                wal_mode: true,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, RecallError> {
        self.db.get().ok_or_else(|| RecallError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RecallError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RecallError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RecallError> {
        self.db()?.checkpoint().await
    }

    // --- Fragments ---

    async fn insert_fragment(&self, fragment: &Fragment) -> Result<bool, RecallError> {
        queries::fragments::insert_fragment(self.db()?, fragment).await
    }

    async fn fragment_exists(
        &self,
        scope_id: &str,
        content_hash: &str,
    ) -> Result<bool, RecallError> {
        queries::fragments::fragment_exists(self.db()?, scope_id, content_hash).await
    }

    async fn keyword_search(
        &self,
        scope_id: &str,
        fts_query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>, RecallError> {
        queries::fragments::keyword_search(self.db()?, scope_id, fts_query, limit).await
    }

    async fn fragments_with_embeddings(
        &self,
        scope_id: &str,
    ) -> Result<Vec<Fragment>, RecallError> {
        queries::fragments::fragments_with_embeddings(self.db()?, scope_id).await
    }

    async fn fragments_missing_embeddings(
        &self,
        limit: usize,
    ) -> Result<Vec<Fragment>, RecallError> {
        queries::fragments::fragments_missing_embeddings(self.db()?, limit).await
    }

    async fn set_fragment_embedding(
        &self,
        id: &str,
        embedding: &[f32],
        model: &str,
    ) -> Result<bool, RecallError> {
        queries::fragments::set_fragment_embedding(self.db()?, id, embedding, model).await
    }

    async fn count_fragments(&self) -> Result<usize, RecallError> {
        queries::fragments::count_fragments(self.db()?).await
    }

    async fn link_fragment_doc(
        &self,
        scope_id: &str,
        content_hash: &str,
        doc_id: &str,
    ) -> Result<bool, RecallError> {
        queries::fragments::link_fragment_doc(self.db()?, scope_id, content_hash, doc_id).await
    }

    async fn delete_fragments_for_doc(&self, doc_id: &str) -> Result<usize, RecallError> {
        queries::fragments::delete_fragments_for_doc(self.db()?, doc_id).await
    }

    async fn count_doc_fragments(&self, doc_id: &str) -> Result<usize, RecallError> {
        queries::fragments::count_doc_fragments(self.db()?, doc_id).await
    }

    // --- Raw messages ---

    async fn insert_raw_message(&self, message: &RawMessage) -> Result<(), RecallError> {
        queries::messages::insert_raw_message(self.db()?, message).await
    }

    async fn load_raw_messages(
        &self,
        scope_id: &str,
        limit: usize,
    ) -> Result<Vec<RawMessage>, RecallError> {
        queries::messages::load_raw_messages(self.db()?, scope_id, limit).await
    }

    // --- Knowledge documents ---

    async fn upsert_knowledge_doc(&self, doc: &KnowledgeDoc) -> Result<(), RecallError> {
        queries::knowledge::upsert_knowledge_doc(self.db()?, doc).await
    }

    async fn get_knowledge_doc(&self, id: &str) -> Result<Option<KnowledgeDoc>, RecallError> {
        queries::knowledge::get_knowledge_doc(self.db()?, id).await
    }

    async fn list_knowledge_docs(&self) -> Result<Vec<KnowledgeDoc>, RecallError> {
        queries::knowledge::list_knowledge_docs(self.db()?).await
    }

    async fn count_knowledge_docs(&self) -> Result<usize, RecallError> {
        queries::knowledge::count_knowledge_docs(self.db()?).await
    }

    async fn delete_knowledge_doc(&self, id: &str) -> Result<bool, RecallError> {
        queries::knowledge::delete_knowledge_doc(self.db()?, id).await
    }

    // --- Embedding cache ---

    async fn get_cached_embedding(
        &self,
        hash: &str,
    ) -> Result<Option<EmbeddingCacheEntry>, RecallError> {
        queries::embedding_cache::get_cached_embedding(self.db()?, hash).await
    }

    async fn put_cached_embedding(&self, entry: &EmbeddingCacheEntry) -> Result<(), RecallError> {
        queries::embedding_cache::put_cached_embedding(self.db()?, entry).await
    }

    async fn count_cached_embeddings(&self) -> Result<usize, RecallError> {
        queries::embedding_cache::count_cached_embeddings(self.db()?).await
    }

    async fn evict_cached_embeddings(
        &self,
        max_entries: Option<usize>,
        older_than: Option<&str>,
    ) -> Result<usize, RecallError> {
        queries::embedding_cache::evict_cached_embeddings(self.db()?, max_entries, older_than)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{FragmentSource, KNOWLEDGE_SCOPE};
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        assert!(storage.count_fragments().await.is_err());
    }

    #[tokio::test]
    async fn from_database_is_ready_immediately() {
        let db = Database::open_in_memory().await.unwrap();
        let storage = SqliteStorage::from_database(db);

        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(storage.count_fragments().await.unwrap(), 0);
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn knowledge_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let doc = KnowledgeDoc {
            id: "doc-1".to_string(),
            title: "Escalation policy".to_string(),
            content: "page the on-call engineer".to_string(),
            category: "ops".to_string(),
            chunk_count: 1,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        storage.upsert_knowledge_doc(&doc).await.unwrap();
        storage
            .insert_fragment(&Fragment {
                id: "frag-1".to_string(),
                scope_id: KNOWLEDGE_SCOPE.to_string(),
                text: doc.content.clone(),
                content_hash: "h1".to_string(),
                embedding: None,
                model: None,
                source: FragmentSource::Knowledge,
                doc_id: Some(doc.id.clone()),
                start_line: 1,
                end_line: 1,
                created_at: doc.created_at.clone(),
            })
            .await
            .unwrap();

        assert_eq!(storage.count_knowledge_docs().await.unwrap(), 1);
        let hits = storage
            .keyword_search(KNOWLEDGE_SCOPE, "\"engineer\"", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(
            storage
                .link_fragment_doc(KNOWLEDGE_SCOPE, "h1", "doc-1")
                .await
                .unwrap()
        );
        assert_eq!(storage.count_doc_fragments("doc-1").await.unwrap(), 1);

        assert_eq!(storage.delete_fragments_for_doc("doc-1").await.unwrap(), 1);
        assert!(storage.delete_knowledge_doc("doc-1").await.unwrap());
        assert_eq!(storage.count_fragments().await.unwrap(), 0);

        storage.close().await.unwrap();
    }
}
