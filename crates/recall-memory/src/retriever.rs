// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid retriever combining cosine similarity and FTS5 BM25 relevance.
//!
//! The keyword and vector paths run concurrently and are merged into one
//! score record per fragment. Records found by both paths get a weighted
//! sum, records found by one path keep that path's score. Scores below
//! `min_score` are dropped, conversation fragments are decayed by age,
//! and the survivors are diversified with MMR.

use std::collections::HashMap;
use std::sync::Arc;

use recall_core::{Fragment, KNOWLEDGE_SCOPE, RecallError, StorageAdapter};
use tracing::{debug, warn};

use crate::decay::decay_multiplier_at;
use crate::embedder::CachedEmbedder;
use crate::mmr::mmr_rerank;
use crate::query::{build_fts_query, extract_keywords};
use crate::types::{MatchKind, SearchOptions, SearchResult};

/// Lower bound on over-provisioned keyword candidates.
const MIN_KEYWORD_CANDIDATES: usize = 24;

/// Hybrid retriever over a storage adapter and an optional embedder.
///
/// Without an embedder every result is keyword-matched.
pub struct HybridRetriever {
    storage: Arc<dyn StorageAdapter>,
    embedder: Option<Arc<CachedEmbedder>>,
}

/// Per-fragment merge record.
struct Candidate {
    fragment: Fragment,
    vector: Option<f32>,
    keyword: Option<f32>,
}

impl HybridRetriever {
    pub fn new(storage: Arc<dyn StorageAdapter>, embedder: Option<Arc<CachedEmbedder>>) -> Self {
        Self { storage, embedder }
    }

    /// Rank fragments of `scope` (plus the knowledge scope) against `query`.
    pub async fn search(
        &self,
        query: &str,
        scope: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RecallError> {
        let query = query.trim();
        if query.is_empty() || options.limit == 0 {
            return Ok(Vec::new());
        }

        let terms = extract_keywords(query);
        let mut fts_query = build_fts_query(&terms);
        if fts_query.is_empty() && self.embedder.is_none() {
            debug!(query, "no keywords extracted, searching the literal query");
            fts_query = build_fts_query(&[query]);
        }
        let candidate_limit = (options.limit * 4).max(MIN_KEYWORD_CANDIDATES);

        let (keyword, vector) = tokio::join!(
            self.keyword_candidates(scope, &fts_query, candidate_limit),
            self.vector_candidates(query, scope),
        );
        let keyword = keyword?;
        let vector = vector?;
        debug!(
            scope,
            keyword = keyword.len(),
            vector = vector.len(),
            "search candidates collected"
        );

        let mut merged: HashMap<String, Candidate> = HashMap::new();
        for (fragment, score) in vector {
            merged.insert(
                fragment.id.clone(),
                Candidate {
                    fragment,
                    vector: Some(score),
                    keyword: None,
                },
            );
        }
        for (fragment, score) in keyword {
            merged
                .entry(fragment.id.clone())
                .and_modify(|c| c.keyword = Some(score))
                .or_insert(Candidate {
                    fragment,
                    vector: None,
                    keyword: Some(score),
                });
        }

        let now = chrono::Utc::now();
        let mut results: Vec<SearchResult> = merged
            .into_values()
            .filter_map(|c| {
                let (score, source) = match (c.vector, c.keyword) {
                    (Some(v), Some(k)) => (
                        options.vector_weight * v + options.keyword_weight * k,
                        MatchKind::Hybrid,
                    ),
                    (Some(v), None) => (v, MatchKind::Vector),
                    (None, Some(k)) => (k, MatchKind::Keyword),
                    (None, None) => return None,
                };
                if score < options.min_score {
                    return None;
                }
                let score = if options.decay_enabled && !c.fragment.is_knowledge() {
                    let multiplier =
                        decay_multiplier_at(&c.fragment.created_at, options.half_life_days, now);
                    (f64::from(score) * multiplier) as f32
                } else {
                    score
                };
                Some(SearchResult {
                    fragment_id: c.fragment.id,
                    scope_id: c.fragment.scope_id,
                    text: c.fragment.text,
                    score,
                    source,
                    origin: c.fragment.source,
                    created_at: c.fragment.created_at,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.fragment_id.cmp(&b.fragment_id))
        });

        if options.mmr_enabled && results.len() > 1 {
            Ok(mmr_rerank(results, options.mmr_lambda, options.limit))
        } else {
            results.truncate(options.limit);
            Ok(results)
        }
    }

    /// FTS candidates from the scope and the knowledge scope, scores in `[0, 1]`.
    async fn keyword_candidates(
        &self,
        scope: &str,
        fts_query: &str,
        limit: usize,
    ) -> Result<Vec<(Fragment, f32)>, RecallError> {
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let mut best: HashMap<String, (Fragment, f64)> = HashMap::new();
        for scope_id in search_scopes(scope) {
            for hit in self.storage.keyword_search(scope_id, fts_query, limit).await? {
                match best.get_mut(&hit.fragment.id) {
                    Some(entry) if entry.1 >= hit.relevance => {}
                    Some(entry) => entry.1 = hit.relevance,
                    None => {
                        best.insert(hit.fragment.id.clone(), (hit.fragment, hit.relevance));
                    }
                }
            }
        }

        let max = best.values().map(|(_, r)| *r).fold(f64::MIN, f64::max);
        Ok(best
            .into_values()
            .map(|(fragment, relevance)| {
                let normalized = if max > 0.0 {
                    (relevance / max).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                (fragment, normalized as f32)
            })
            .collect())
    }

    /// Cosine similarity of every embedded fragment in scope against the query.
    ///
    /// A provider failure is logged and yields no candidates.
    async fn vector_candidates(
        &self,
        query: &str,
        scope: &str,
    ) -> Result<Vec<(Fragment, f32)>, RecallError> {
        let Some(embedder) = &self.embedder else {
            return Ok(Vec::new());
        };
        let query_embedding = match embedder.embed_query(query).await {
            Ok(v) => v,
            Err(e) if e.is_embedding_failure() => {
                warn!(error = %e, "query embedding failed, falling back to keyword search");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut scored = Vec::new();
        for scope_id in search_scopes(scope) {
            for fragment in self.storage.fragments_with_embeddings(scope_id).await? {
                let Some(embedding) = &fragment.embedding else {
                    continue;
                };
                if embedding.len() != query_embedding.len() {
                    continue;
                }
                let similarity = cosine_similarity(&query_embedding, embedding);
                scored.push((fragment, similarity));
            }
        }
        Ok(scored)
    }
}

/// The caller's scope followed by the knowledge scope, without repeats.
fn search_scopes(scope: &str) -> Vec<&str> {
    if scope == KNOWLEDGE_SCOPE {
        vec![KNOWLEDGE_SCOPE]
    } else {
        vec![scope, KNOWLEDGE_SCOPE]
    }
}

/// Cosine similarity of two equally sized vectors. Zero when either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
