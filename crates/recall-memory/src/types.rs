// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result, option and report types for the memory engine.

use recall_config::model::MemoryConfig;
use recall_core::{AdapterType, FragmentSource};
use serde::{Deserialize, Serialize};
use strum::Display;

/// How a search result was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Found by both the vector and the keyword path.
    Hybrid,
    /// Found by cosine similarity only.
    Vector,
    /// Found by full-text search only.
    Keyword,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub fragment_id: String,
    pub scope_id: String,
    pub text: String,
    /// Final score after weighting and decay. Higher is better.
    pub score: f32,
    /// Which retrieval path produced the hit.
    pub source: MatchKind,
    /// Where the fragment text came from.
    pub origin: FragmentSource,
    pub created_at: String,
}

/// Per-call search knobs. Defaults come from `[memory]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub limit: usize,
    pub min_score: f32,
    pub vector_weight: f32,
    pub keyword_weight: f32,
    pub mmr_enabled: bool,
    pub mmr_lambda: f32,
    pub decay_enabled: bool,
    pub half_life_days: f64,
}

impl SearchOptions {
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            limit: config.max_results,
            min_score: config.min_score,
            vector_weight: config.vector_weight,
            keyword_weight: config.keyword_weight,
            mmr_enabled: config.mmr.enabled,
            mmr_lambda: config.mmr.lambda,
            decay_enabled: config.decay.enabled,
            half_life_days: config.decay.half_life_days,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn without_mmr(mut self) -> Self {
        self.mmr_enabled = false;
        self
    }

    pub fn without_decay(mut self) -> Self {
        self.decay_enabled = false;
        self
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

/// Chunk geometry in approximate tokens (4 characters per token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub tokens: usize,
    pub overlap: usize,
}

impl ChunkOptions {
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            tokens: config.chunk_tokens,
            overlap: config.chunk_overlap,
        }
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            tokens: 256,
            overlap: 32,
        }
    }
}

/// Outcome of a save call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Chunks produced from the text.
    pub chunks: usize,
    /// Fragments written.
    pub inserted: usize,
    /// Chunks skipped because their hash already existed in the scope.
    pub duplicates: usize,
    /// Inserted fragments that carry an embedding.
    pub embedded: usize,
}

/// Diagnostic snapshot of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStatus {
    /// Active embedding provider (`ollama`, `openai`), or `None` in keyword-only mode.
    pub provider_id: Option<String>,
    pub model: Option<String>,
    /// `hybrid` when a provider is active, otherwise `keyword`.
    pub search_mode: String,
    pub fragment_count: usize,
    pub cache_count: usize,
    pub knowledge_doc_count: usize,
    pub storage: AdapterStatus,
    /// `None` in keyword-only mode.
    pub provider: Option<AdapterStatus>,
}

/// Identity and last health check of one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterStatus {
    pub kind: AdapterType,
    pub name: String,
    pub version: String,
    /// `healthy`, `degraded: <reason>` or `unhealthy: <reason>`.
    pub health: String,
}
