// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent embedding cache keyed by content hash.

use recall_core::{EmbeddingCacheEntry, RecallError};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use crate::blob::{blob_to_vec, vec_to_blob};
use crate::database::{Database, map_tr_err};

/// Look up a cached embedding.
///
/// A non-BLOB value, or a BLOB whose length does not match the stored
/// dimensionality, is reported as a miss so the caller recomputes and
/// overwrites it.
pub async fn get_cached_embedding(
    db: &Database,
    hash: &str,
) -> Result<Option<EmbeddingCacheEntry>, RecallError> {
    let hash = hash.to_string();
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    "SELECT embedding, dims, model, updated_at FROM embedding_cache WHERE hash = ?1",
                    params![hash],
                    |row| {
                        Ok((
                            row.get::<_, Value>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let Some((value, dims, model, updated_at)) = row else {
                return Ok(None);
            };
            let dims = dims.max(0) as usize;
            let blob = match value {
                Value::Blob(blob) => blob,
                other => {
                    warn!(hash = %hash, column_type = %other.data_type(), "embedding cache entry is not a blob");
                    return Ok(None);
                }
            };
            match blob_to_vec(&blob) {
                Some(embedding) if embedding.len() == dims => Ok(Some(EmbeddingCacheEntry {
                    hash,
                    embedding,
                    dims,
                    model,
                    updated_at,
                })),
                _ => {
                    warn!(hash = %hash, dims, bytes = blob.len(), "corrupt embedding cache entry");
                    Ok(None)
                }
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Write or overwrite a cache entry. Last writer wins per hash.
pub async fn put_cached_embedding(
    db: &Database,
    entry: &EmbeddingCacheEntry,
) -> Result<(), RecallError> {
    let hash = entry.hash.clone();
    let blob = vec_to_blob(&entry.embedding);
    let dims = entry.embedding.len() as i64;
    let model = entry.model.clone();
    let updated_at = entry.updated_at.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO embedding_cache (hash, embedding, dims, model, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![hash, blob, dims, model, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_cached_embeddings(db: &Database) -> Result<usize, RecallError> {
    db.connection()
        .call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM embedding_cache", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
        .map_err(map_tr_err)
}

/// Drop entries last updated before `older_than`, then trim to `max_entries`
/// keeping the most recently updated. Both steps run in one transaction.
pub async fn evict_cached_embeddings(
    db: &Database,
    max_entries: Option<usize>,
    older_than: Option<&str>,
) -> Result<usize, RecallError> {
    if max_entries.is_none() && older_than.is_none() {
        return Ok(0);
    }
    let older_than = older_than.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut removed = 0;
            if let Some(cutoff) = older_than {
                removed += tx.execute(
                    "DELETE FROM embedding_cache WHERE updated_at < ?1",
                    params![cutoff],
                )?;
            }
            if let Some(max) = max_entries {
                removed += tx.execute(
                    "DELETE FROM embedding_cache WHERE hash IN (
                         SELECT hash FROM embedding_cache
                         ORDER BY updated_at DESC, hash DESC
                         LIMIT -1 OFFSET ?1
                     )",
                    params![max as i64],
                )?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("cache.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_entry(hash: &str, embedding: Vec<f32>, updated_at: &str) -> EmbeddingCacheEntry {
        EmbeddingCacheEntry {
            hash: hash.to_string(),
            dims: embedding.len(),
            embedding,
            model: "test-model".to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    #[tokio::test]
    async fn put_then_get_preserves_vector() {
        let (db, _dir) = setup_db().await;
        let entry = make_entry("h1", vec![0.1, 0.2, 0.3], "2026-03-01T00:00:00.000Z");
        put_cached_embedding(&db, &entry).await.unwrap();

        let cached = get_cached_embedding(&db, "h1").await.unwrap().unwrap();
        assert_eq!(cached.embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(cached.dims, 3);
        assert_eq!(cached.model, "test-model");
    }

    #[tokio::test]
    async fn missing_hash_is_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_cached_embedding(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_hash() {
        let (db, _dir) = setup_db().await;
        put_cached_embedding(&db, &make_entry("h1", vec![1.0], "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();
        put_cached_embedding(&db, &make_entry("h1", vec![2.0, 3.0], "2026-03-02T00:00:00.000Z"))
            .await
            .unwrap();

        let cached = get_cached_embedding(&db, "h1").await.unwrap().unwrap();
        assert_eq!(cached.embedding, vec![2.0, 3.0]);
        assert_eq!(count_cached_embeddings(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_miss() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO embedding_cache (hash, embedding, dims, model, updated_at)
                     VALUES ('bad', x'0000803F00', 2, 'm', '2026-03-01T00:00:00.000Z')",
                    [],
                )
            })
            .await
            .unwrap();

        assert!(get_cached_embedding(&db, "bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_blob_entry_reads_as_miss() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO embedding_cache (hash, embedding, dims, model, updated_at)
                     VALUES ('text', 'not a vector', 2, 'm', '2026-03-01T00:00:00.000Z'),
                            ('int', 42, 2, 'm', '2026-03-01T00:00:00.000Z')",
                    [],
                )
            })
            .await
            .unwrap();

        assert!(get_cached_embedding(&db, "text").await.unwrap().is_none());
        assert!(get_cached_embedding(&db, "int").await.unwrap().is_none());

        let entry = EmbeddingCacheEntry {
            hash: "text".to_string(),
            embedding: vec![0.5, 0.25],
            dims: 2,
            model: "m".to_string(),
            updated_at: "2026-03-02T00:00:00.000Z".to_string(),
        };
        put_cached_embedding(&db, &entry).await.unwrap();
        let read = get_cached_embedding(&db, "text").await.unwrap().unwrap();
        assert_eq!(read.embedding, vec![0.5, 0.25]);
    }

    #[tokio::test]
    async fn evict_by_count_keeps_most_recent() {
        let (db, _dir) = setup_db().await;
        for i in 1..=4 {
            let ts = format!("2026-03-0{i}T00:00:00.000Z");
            put_cached_embedding(&db, &make_entry(&format!("h{i}"), vec![i as f32], &ts))
                .await
                .unwrap();
        }

        let removed = evict_cached_embeddings(&db, Some(2), None).await.unwrap();
        assert_eq!(removed, 2);
        assert!(get_cached_embedding(&db, "h1").await.unwrap().is_none());
        assert!(get_cached_embedding(&db, "h4").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn evict_by_age() {
        let (db, _dir) = setup_db().await;
        put_cached_embedding(&db, &make_entry("old", vec![1.0], "2025-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        put_cached_embedding(&db, &make_entry("new", vec![1.0], "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();

        let removed = evict_cached_embeddings(&db, None, Some("2026-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(count_cached_embeddings(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn evict_without_bounds_is_noop() {
        let (db, _dir) = setup_db().await;
        put_cached_embedding(&db, &make_entry("h", vec![1.0], "2026-03-01T00:00:00.000Z"))
            .await
            .unwrap();
        assert_eq!(evict_cached_embeddings(&db, None, None).await.unwrap(), 0);
    }
}
