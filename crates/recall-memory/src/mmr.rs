// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maximal Marginal Relevance reranking over result text.
//!
//! Similarity between two results is the Jaccard overlap of their
//! lowercased whitespace tokens, so reranking needs no embeddings and
//! works in keyword-only mode.

use std::collections::HashSet;

use crate::types::SearchResult;

fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Jaccard similarity of two token sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Select up to `limit` results balancing relevance against redundancy.
///
/// Each step picks the candidate maximizing
/// `lambda * score - (1 - lambda) * max_similarity_to_selected`; ties go
/// to the earlier candidate. The first pick is the highest score.
pub fn mmr_rerank(candidates: Vec<SearchResult>, lambda: f32, limit: usize) -> Vec<SearchResult> {
    if candidates.len() <= 1 {
        let mut candidates = candidates;
        candidates.truncate(limit);
        return candidates;
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let tokens: Vec<HashSet<String>> = candidates.iter().map(|c| token_set(&c.text)).collect();
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(limit.min(candidates.len()));

    while selected.len() < limit && !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;
        for (position, &index) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&chosen| jaccard(&tokens[index], &tokens[chosen]))
                .fold(0.0_f32, f32::max);
            let value = if selected.is_empty() {
                candidates[index].score
            } else {
                lambda * candidates[index].score - (1.0 - lambda) * redundancy
            };
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((position, value));
            }
        }
        let Some((position, _)) = best else { break };
        selected.push(remaining.remove(position));
    }

    let mut slots: Vec<Option<SearchResult>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
