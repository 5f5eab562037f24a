// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Recall memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Recall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding provider and cache settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking and retrieval defaults.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("recall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Embedding provider configuration.
///
/// The provider is picked once at startup: a local embedding service when
/// `local_url` is set, otherwise the cloud API when `api_key` is set,
/// otherwise none (keyword-only search).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Master switch. When false, the engine runs keyword-only.
    #[serde(default = "default_embedding_enabled")]
    pub enabled: bool,

    /// Base URL of a local Ollama-compatible embedding service.
    #[serde(default)]
    pub local_url: Option<String>,

    /// Model requested from the local service.
    #[serde(default = "default_local_model")]
    pub local_model: String,

    /// API key for the OpenAI-compatible cloud embedding endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the cloud embedding endpoint.
    #[serde(default = "default_cloud_base_url")]
    pub cloud_base_url: String,

    /// Model requested from the cloud endpoint.
    #[serde(default = "default_cloud_model")]
    pub cloud_model: String,

    /// Per-request timeout for provider calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of embedding cache entries. `None` means unbounded.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: Option<usize>,

    /// Entries not updated for this many days are evicted. `None` disables age eviction.
    #[serde(default)]
    pub cache_max_age_days: Option<u32>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_embedding_enabled(),
            local_url: None,
            local_model: default_local_model(),
            api_key: None,
            cloud_base_url: default_cloud_base_url(),
            cloud_model: default_cloud_model(),
            timeout_secs: default_timeout_secs(),
            cache_max_entries: default_cache_max_entries(),
            cache_max_age_days: None,
        }
    }
}

fn default_embedding_enabled() -> bool {
    true
}

fn default_local_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_cloud_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_cloud_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_max_entries() -> Option<usize> {
    Some(50_000)
}

/// Chunking and retrieval defaults. Every search field can be overridden per call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Approximate tokens per chunk (4 characters per token).
    #[serde(default = "default_chunk_tokens")]
    pub chunk_tokens: usize,

    /// Approximate tokens carried over from the previous chunk.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Maximum number of results returned by a search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Results scoring below this are dropped before decay and reranking.
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Weight of cosine similarity in hybrid scores.
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// Weight of the normalized lexical score in hybrid scores.
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Character budget for the prompt digest.
    #[serde(default = "default_prompt_char_budget")]
    pub prompt_char_budget: usize,

    /// Diversity reranking.
    #[serde(default)]
    pub mmr: MmrConfig,

    /// Recency weighting.
    #[serde(default)]
    pub decay: DecayConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: default_chunk_tokens(),
            chunk_overlap: default_chunk_overlap(),
            max_results: default_max_results(),
            min_score: default_min_score(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            prompt_char_budget: default_prompt_char_budget(),
            mmr: MmrConfig::default(),
            decay: DecayConfig::default(),
        }
    }
}

fn default_chunk_tokens() -> usize {
    256
}

fn default_chunk_overlap() -> usize {
    32
}

fn default_max_results() -> usize {
    6
}

fn default_min_score() -> f32 {
    0.35
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_keyword_weight() -> f32 {
    0.3
}

fn default_prompt_char_budget() -> usize {
    2000
}

/// Maximal Marginal Relevance settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MmrConfig {
    #[serde(default = "default_mmr_enabled")]
    pub enabled: bool,

    /// 1.0 ranks purely by relevance, 0.0 purely by novelty.
    #[serde(default = "default_mmr_lambda")]
    pub lambda: f32,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self {
            enabled: default_mmr_enabled(),
            lambda: default_mmr_lambda(),
        }
    }
}

fn default_mmr_enabled() -> bool {
    true
}

fn default_mmr_lambda() -> f32 {
    0.7
}

/// Temporal decay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DecayConfig {
    #[serde(default = "default_decay_enabled")]
    pub enabled: bool,

    /// Age in days at which a score is halved. Zero or less disables decay.
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            enabled: default_decay_enabled(),
            half_life_days: default_half_life_days(),
        }
    }
}

fn default_decay_enabled() -> bool {
    true
}

fn default_half_life_days() -> f64 {
    30.0
}
