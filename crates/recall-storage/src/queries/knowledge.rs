// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge document CRUD operations.

use recall_core::{KnowledgeDoc, RecallError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn row_to_doc(row: &rusqlite::Row<'_>) -> Result<KnowledgeDoc, rusqlite::Error> {
    let chunk_count: i64 = row.get(4)?;
    Ok(KnowledgeDoc {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        chunk_count: chunk_count.max(0) as usize,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a document, or replace everything but `created_at` when the id exists.
pub async fn upsert_knowledge_doc(db: &Database, doc: &KnowledgeDoc) -> Result<(), RecallError> {
    let doc = doc.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO knowledge_docs (id, title, content, category, chunk_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     content = excluded.content,
                     category = excluded.category,
                     chunk_count = excluded.chunk_count,
                     updated_at = excluded.updated_at",
                params![
                    doc.id,
                    doc.title,
                    doc.content,
                    doc.category,
                    doc.chunk_count as i64,
                    doc.created_at,
                    doc.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_knowledge_doc(db: &Database, id: &str) -> Result<Option<KnowledgeDoc>, RecallError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let doc = conn
                .query_row(
                    "SELECT id, title, content, category, chunk_count, created_at, updated_at
                     FROM knowledge_docs WHERE id = ?1",
                    params![id],
                    row_to_doc,
                )
                .optional()?;
            Ok(doc)
        })
        .await
        .map_err(map_tr_err)
}

/// All documents, oldest first.
pub async fn list_knowledge_docs(db: &Database) -> Result<Vec<KnowledgeDoc>, RecallError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, category, chunk_count, created_at, updated_at
                 FROM knowledge_docs ORDER BY created_at ASC, id ASC",
            )?;
            let docs = stmt
                .query_map([], row_to_doc)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(docs)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_knowledge_docs(db: &Database) -> Result<usize, RecallError> {
    db.connection()
        .call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM knowledge_docs", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a document row. Its fragments are removed separately.
pub async fn delete_knowledge_doc(db: &Database, id: &str) -> Result<bool, RecallError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM knowledge_docs WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
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
        let db_path = dir.path().join("knowledge.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_doc(id: &str, title: &str) -> KnowledgeDoc {
        KnowledgeDoc {
            id: id.to_string(),
            title: title.to_string(),
            content: "line one\nline two".to_string(),
            category: "ops".to_string(),
            chunk_count: 1,
            created_at: "2026-02-01T00:00:00.000Z".to_string(),
            updated_at: "2026-02-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let (db, _dir) = setup_db().await;
        upsert_knowledge_doc(&db, &make_doc("d1", "Runbook")).await.unwrap();

        let doc = get_knowledge_doc(&db, "d1").await.unwrap().unwrap();
        assert_eq!(doc.title, "Runbook");
        assert_eq!(doc.chunk_count, 1);
        assert!(get_knowledge_doc(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_updates_but_keeps_created_at() {
        let (db, _dir) = setup_db().await;
        upsert_knowledge_doc(&db, &make_doc("d1", "Runbook")).await.unwrap();

        let mut updated = make_doc("d1", "Runbook v2");
        updated.chunk_count = 3;
        updated.created_at = "2030-01-01T00:00:00.000Z".to_string();
        updated.updated_at = "2026-02-02T00:00:00.000Z".to_string();
        upsert_knowledge_doc(&db, &updated).await.unwrap();

        let doc = get_knowledge_doc(&db, "d1").await.unwrap().unwrap();
        assert_eq!(doc.title, "Runbook v2");
        assert_eq!(doc.chunk_count, 3);
        assert_eq!(doc.created_at, "2026-02-01T00:00:00.000Z");
        assert_eq!(doc.updated_at, "2026-02-02T00:00:00.000Z");
        assert_eq!(count_knowledge_docs(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (db, _dir) = setup_db().await;
        upsert_knowledge_doc(&db, &make_doc("d1", "A")).await.unwrap();
        upsert_knowledge_doc(&db, &make_doc("d2", "B")).await.unwrap();
        assert_eq!(list_knowledge_docs(&db).await.unwrap().len(), 2);

        assert!(delete_knowledge_doc(&db, "d1").await.unwrap());
        assert!(!delete_knowledge_doc(&db, "d1").await.unwrap());
        let remaining = list_knowledge_docs(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "d2");
    }
}
