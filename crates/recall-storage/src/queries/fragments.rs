// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fragment persistence and the FTS5 lexical search primitive.

use recall_core::{Fragment, FragmentSource, KeywordHit, RecallError};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params};

use crate::blob::{blob_to_vec, vec_to_blob};
use crate::database::{Database, map_tr_err};

const FRAGMENT_COLUMNS: &str = "f.id, f.scope_id, f.text, f.content_hash, f.embedding, f.model, \
     f.source, f.doc_id, f.start_line, f.end_line, f.created_at";

/// Build a Fragment from a row selected with [`FRAGMENT_COLUMNS`].
///
/// An embedding that is not a decodable BLOB reads back as `None`, so the
/// fragment is treated as unembedded rather than failing the query.
fn row_to_fragment(row: &rusqlite::Row<'_>) -> Result<Fragment, rusqlite::Error> {
    let embedding = match row.get::<_, Value>(4)? {
        Value::Blob(blob) => blob_to_vec(&blob),
        _ => None,
    };
    let source: String = row.get(6)?;
    let start_line: i64 = row.get(8)?;
    let end_line: i64 = row.get(9)?;
    Ok(Fragment {
        id: row.get(0)?,
        scope_id: row.get(1)?,
        text: row.get(2)?,
        content_hash: row.get(3)?,
        embedding,
        model: row.get(5)?,
        source: FragmentSource::from_str_value(&source),
        doc_id: row.get(7)?,
        start_line: start_line.max(0) as usize,
        end_line: end_line.max(0) as usize,
        created_at: row.get(10)?,
    })
}

/// Insert a fragment unless `(scope_id, content_hash)` is already present.
///
/// Returns `true` when a row was written.
pub async fn insert_fragment(db: &Database, fragment: &Fragment) -> Result<bool, RecallError> {
    let fragment = fragment.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO fragments (id, scope_id, text, content_hash, embedding, \
                 model, source, doc_id, start_line, end_line, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    fragment.id,
                    fragment.scope_id,
                    fragment.text,
                    fragment.content_hash,
                    fragment.embedding.as_deref().map(vec_to_blob),
                    fragment.model,
                    fragment.source.as_str(),
                    fragment.doc_id,
                    fragment.start_line as i64,
                    fragment.end_line as i64,
                    fragment.created_at,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether the scope already holds a fragment with this content hash.
pub async fn fragment_exists(
    db: &Database,
    scope_id: &str,
    content_hash: &str,
) -> Result<bool, RecallError> {
    let scope_id = scope_id.to_string();
    let content_hash = content_hash.to_string();
    db.connection()
        .call(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM fragments WHERE scope_id = ?1 AND content_hash = ?2",
                    params![scope_id, content_hash],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
        .map_err(map_tr_err)
}

/// Run an FTS5 MATCH query restricted to one scope.
///
/// Relevance is the negated BM25 score, so higher is better.
pub async fn keyword_search(
    db: &Database,
    scope_id: &str,
    fts_query: &str,
    limit: usize,
) -> Result<Vec<KeywordHit>, RecallError> {
    if fts_query.trim().is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let scope_id = scope_id.to_string();
    let fts_query = fts_query.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {FRAGMENT_COLUMNS}, -bm25(fragments_fts) AS relevance
                 FROM fragments_fts
                 JOIN fragments f ON f.rowid = fragments_fts.rowid
                 WHERE fragments_fts MATCH ?1 AND f.scope_id = ?2
                 ORDER BY relevance DESC, f.id ASC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let hits = stmt
                .query_map(params![fts_query, scope_id, limit as i64], |row| {
                    Ok(KeywordHit {
                        fragment: row_to_fragment(row)?,
                        relevance: row.get(11)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(hits)
        })
        .await
        .map_err(map_tr_err)
}

/// All fragments of a scope that carry a decodable embedding.
pub async fn fragments_with_embeddings(
    db: &Database,
    scope_id: &str,
) -> Result<Vec<Fragment>, RecallError> {
    let scope_id = scope_id.to_string();
    let fragments = db
        .connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {FRAGMENT_COLUMNS} FROM fragments f
                 WHERE f.scope_id = ?1 AND f.embedding IS NOT NULL
                 ORDER BY f.created_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![scope_id], row_to_fragment)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;
    Ok(fragments
        .into_iter()
        .filter(|f| f.embedding.is_some())
        .collect())
}

/// Fragments in any scope stored without an embedding, oldest first.
pub async fn fragments_missing_embeddings(
    db: &Database,
    limit: usize,
) -> Result<Vec<Fragment>, RecallError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {FRAGMENT_COLUMNS} FROM fragments f
                 WHERE f.embedding IS NULL
                 ORDER BY f.created_at ASC, f.id ASC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit as i64], row_to_fragment)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Attach an embedding to a fragment that has none yet.
pub async fn set_fragment_embedding(
    db: &Database,
    id: &str,
    embedding: &[f32],
    model: &str,
) -> Result<bool, RecallError> {
    let id = id.to_string();
    let blob = vec_to_blob(embedding);
    let model = model.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE fragments SET embedding = ?1, model = ?2
                 WHERE id = ?3 AND embedding IS NULL",
                params![blob, model, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_fragments(db: &Database) -> Result<usize, RecallError> {
    db.connection()
        .call(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM fragments", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
        .map_err(map_tr_err)
}

/// Record that `doc_id` expands into the fragment stored under
/// `(scope_id, content_hash)`.
///
/// Returns `false` when no such fragment exists or the link is already there.
pub async fn link_fragment_doc(
    db: &Database,
    scope_id: &str,
    content_hash: &str,
    doc_id: &str,
) -> Result<bool, RecallError> {
    let scope_id = scope_id.to_string();
    let content_hash = content_hash.to_string();
    let doc_id = doc_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO fragment_docs (fragment_id, doc_id)
                 SELECT id, ?3 FROM fragments WHERE scope_id = ?1 AND content_hash = ?2",
                params![scope_id, content_hash, doc_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Detach a knowledge document from its fragments.
///
/// Fragments no other document links to are deleted. Shared fragments
/// survive and are re-tagged to a remaining document. Fragments saved
/// directly (no `doc_id`) are only unlinked. Returns the number deleted.
pub async fn delete_fragments_for_doc(db: &Database, doc_id: &str) -> Result<usize, RecallError> {
    let doc_id = doc_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let deleted = tx.execute(
                "DELETE FROM fragments
                 WHERE doc_id IS NOT NULL
                   AND (doc_id = ?1
                        OR id IN (SELECT fragment_id FROM fragment_docs WHERE doc_id = ?1))
                   AND NOT EXISTS (
                       SELECT 1 FROM fragment_docs l
                       WHERE l.fragment_id = fragments.id AND l.doc_id <> ?1
                   )",
                params![doc_id],
            )?;
            tx.execute("DELETE FROM fragment_docs WHERE doc_id = ?1", params![doc_id])?;
            tx.execute(
                "UPDATE fragments
                 SET doc_id = (SELECT MIN(l.doc_id) FROM fragment_docs l WHERE l.fragment_id = fragments.id)
                 WHERE doc_id = ?1",
                params![doc_id],
            )?;
            tx.commit()?;
            Ok(deleted)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of fragments a knowledge document expands into.
pub async fn count_doc_fragments(db: &Database, doc_id: &str) -> Result<usize, RecallError> {
    let doc_id = doc_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM fragment_docs WHERE doc_id = ?1",
                params![doc_id],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as usize)
        })
        .await
        .map_err(map_tr_err)
}
