// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw message history.

use recall_core::{RawMessage, RecallError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Insert a verbatim conversation turn.
pub async fn insert_raw_message(db: &Database, msg: &RawMessage) -> Result<(), RecallError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO raw_messages (id, scope_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![msg.id, msg.scope_id, msg.role, msg.content, msg.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent `limit` messages of a scope, returned oldest first.
pub async fn load_raw_messages(
    db: &Database,
    scope_id: &str,
    limit: usize,
) -> Result<Vec<RawMessage>, RecallError> {
    let scope_id = scope_id.to_string();
    let mut messages = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, scope_id, role, content, created_at
                 FROM raw_messages WHERE scope_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![scope_id, limit as i64], |row| {
                    Ok(RawMessage {
                        id: row.get(0)?,
                        scope_id: row.get(1)?,
                        role: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;
    messages.reverse();
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("messages.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_msg(id: &str, scope: &str, role: &str, content: &str, timestamp: &str) -> RawMessage {
        RawMessage {
            id: id.to_string(),
            scope_id: scope.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_load_in_chronological_order() {
        let (db, _dir) = setup_db().await;
        insert_raw_message(&db, &make_msg("m1", "s", "user", "hello", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        insert_raw_message(&db, &make_msg("m2", "s", "assistant", "hi", "2026-01-01T00:00:02.000Z"))
            .await
            .unwrap();

        let messages = load_raw_messages(&db, "s", 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn limit_keeps_the_most_recent() {
        let (db, _dir) = setup_db().await;
        for i in 1..=5 {
            let ts = format!("2026-01-01T00:00:0{i}.000Z");
            insert_raw_message(&db, &make_msg(&format!("m{i}"), "s", "user", "x", &ts))
                .await
                .unwrap();
        }

        let messages = load_raw_messages(&db, "s", 2).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m4", "m5"]);
    }

    #[tokio::test]
    async fn other_scopes_are_not_returned() {
        let (db, _dir) = setup_db().await;
        insert_raw_message(&db, &make_msg("m1", "a", "user", "mine", "2026-01-01T00:00:01.000Z"))
            .await
            .unwrap();
        assert!(load_raw_messages(&db, "b", 10).await.unwrap().is_empty());
    }
}
