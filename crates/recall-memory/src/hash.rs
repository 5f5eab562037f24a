// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content hashing for fragment dedup and embedding cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the trimmed text.
///
/// Leading and trailing whitespace never changes the hash, so a chunk
/// re-saved with different padding is still recognized as a duplicate.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.trim().as_bytes()))
}
