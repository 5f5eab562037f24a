// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a memory engine over a SQLite database in a
//! temporary directory, optionally with a [`MockEmbedder`].

use std::path::PathBuf;
use std::sync::Arc;

use recall_config::model::{EmbeddingConfig, MemoryConfig, StorageConfig};
use recall_core::{EmbeddingAdapter, RecallError, StorageAdapter};
use recall_memory::MemoryManager;
use recall_storage::SqliteStorage;

use crate::mock_embedder::MockEmbedder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    embedder: Option<Arc<MockEmbedder>>,
    memory: MemoryConfig,
    embedding: EmbeddingConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            embedder: None,
            memory: MemoryConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }

    /// Use a default [`MockEmbedder`].
    pub fn with_mock_embedder(self) -> Self {
        self.with_embedder(Arc::new(MockEmbedder::new()))
    }

    /// Use the given embedder, keeping a handle for assertions.
    pub fn with_embedder(mut self, embedder: Arc<MockEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use a [`MockEmbedder`] that fails every call.
    pub fn with_failing_embedder(self) -> Self {
        let embedder = MockEmbedder::new();
        embedder.set_failing(true);
        self.with_embedder(Arc::new(embedder))
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Cache bounds and other embedding settings.
    pub fn with_embedding_config(mut self, embedding: EmbeddingConfig) -> Self {
        self.embedding = embedding;
        self
    }

    /// Build the test harness, opening the temp database.
    pub async fn build(self) -> Result<TestHarness, RecallError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| RecallError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("recall-test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let adapter = self
            .embedder
            .clone()
            .map(|e| e as Arc<dyn EmbeddingAdapter>);
        let manager = MemoryManager::new(storage.clone(), adapter, &self.embedding, self.memory);

        Ok(TestHarness {
            manager,
            storage,
            embedder: self.embedder,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A memory engine over temporary storage.
pub struct TestHarness {
    /// The engine under test.
    pub manager: MemoryManager,
    /// The storage adapter shared with the manager.
    pub storage: Arc<dyn StorageAdapter>,
    /// The mock embedder, when one was configured.
    pub embedder: Option<Arc<MockEmbedder>>,
    /// Path of the temporary database file.
    pub db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Keyword-only engine with default settings.
    pub async fn keyword_only() -> Result<Self, RecallError> {
        Self::builder().build().await
    }

    /// Engine with a working mock embedder.
    pub async fn hybrid() -> Result<Self, RecallError> {
        Self::builder().with_mock_embedder().build().await
    }

    /// The configured mock embedder, if any.
    pub fn mock_embedder(&self) -> Option<&MockEmbedder> {
        self.embedder.as_deref()
    }
}
