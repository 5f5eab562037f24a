// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recall memory engine.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the storage backend, the embedding providers, and the
//! retrieval engine.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RecallError;
pub use types::{
    AdapterType, EmbeddingCacheEntry, EmbeddingInput, EmbeddingOutput, Fragment,
    FragmentSource, HealthStatus, KNOWLEDGE_SCOPE, KeywordHit, KnowledgeDoc, RawMessage,
};

pub use traits::{EmbeddingAdapter, PluginAdapter, StorageAdapter};
