// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the embedding layer, and the memory engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reserved scope holding knowledge-base fragments. Visible to every query.
pub const KNOWLEDGE_SCOPE: &str = "__knowledge__";

/// Timestamp format used for every persisted `created_at` / `updated_at` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current UTC time formatted with [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    Storage,
    Embedding,
}

/// Where a fragment's text came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FragmentSource {
    /// A user conversation turn.
    User,
    /// An assistant conversation turn.
    Assistant,
    /// An ingested knowledge document. Stored under [`KNOWLEDGE_SCOPE`].
    Knowledge,
}

impl FragmentSource {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentSource::User => "user",
            FragmentSource::Assistant => "assistant",
            FragmentSource::Knowledge => "knowledge",
        }
    }

    /// Parse from SQLite string. Unknown values read back as `User`.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "assistant" => FragmentSource::Assistant,
            "knowledge" => FragmentSource::Knowledge,
            _ => FragmentSource::User,
        }
    }
}

/// An immutable unit of stored, indexable text plus optional embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique identifier.
    pub id: String,
    /// Owning scope (conversation/user id, or [`KNOWLEDGE_SCOPE`]).
    pub scope_id: String,
    /// Chunk text.
    pub text: String,
    /// SHA-256 hex digest of the trimmed text.
    pub content_hash: String,
    /// Embedding vector, `None` when no provider was available at save time.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    /// Embedding model that produced `embedding`.
    pub model: Option<String>,
    /// Origin of the text.
    pub source: FragmentSource,
    /// Knowledge document this fragment was expanded from.
    pub doc_id: Option<String>,
    /// First line (1-based) of the chunk within the saved text.
    pub start_line: usize,
    /// Last line (1-based, inclusive) of the chunk within the saved text.
    pub end_line: usize,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl Fragment {
    /// True when the fragment belongs to the global knowledge scope.
    pub fn is_knowledge(&self) -> bool {
        self.source == FragmentSource::Knowledge || self.scope_id == KNOWLEDGE_SCOPE
    }
}

/// A verbatim conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub scope_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// A knowledge-base document that expands into knowledge-scope fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    /// Number of fragments inserted for this document.
    pub chunk_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// A cached embedding keyed by content hash.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCacheEntry {
    pub hash: String,
    pub embedding: Vec<f32>,
    pub dims: usize,
    /// Model that produced the vector. Entries from another model are stale.
    pub model: String,
    pub updated_at: String,
}

/// A lexical search hit with its raw relevance (higher is better).
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub fragment: Fragment,
    pub relevance: f64,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter. One vector per input text, in order.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}
