// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid memory engine for Recall.
//!
//! Saves text as deduplicated, embedded fragments and answers relevance
//! queries by merging cosine similarity with FTS5 keyword matches, then
//! applying temporal decay and MMR diversity reranking.
//!
//! ## Architecture
//!
//! - **chunker**: line-oriented chunking with character overlap
//! - **hash**: SHA-256 content hashing for dedup and cache keys
//! - **embedder**: Ollama and OpenAI-compatible providers plus the cache wrapper
//! - **query**: keyword extraction (Latin and CJK/Thai) and FTS5 query building
//! - **decay** / **mmr**: score adjustments applied after merging
//! - **retriever**: the hybrid search algorithm
//! - **manager**: the facade used by callers

pub mod chunker;
pub mod decay;
pub mod embedder;
pub mod hash;
pub mod manager;
pub mod mmr;
pub mod query;
pub mod retriever;
pub mod types;

pub use chunker::{Chunk, chunk_text};
pub use embedder::{CachedEmbedder, EmbeddingBackend, OllamaEmbedder, OpenAiEmbedder};
pub use hash::content_hash;
pub use manager::MemoryManager;
pub use retriever::{HybridRetriever, cosine_similarity};
pub use types::*;
