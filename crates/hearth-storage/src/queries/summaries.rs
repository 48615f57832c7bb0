// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! S4 / S60 summary rows.
//!
//! Both series share one shape and differ only in table; the table name is
//! always taken from [`SummaryKind::table`], never from caller input.

use hearth_core::{HearthError, SummaryKind, SummaryRecord};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::queries::json_column;

fn summary_from_row(kind: SummaryKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<SummaryRecord> {
    Ok(SummaryRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        kind,
        from_turn: row.get(2)?,
        to_turn: row.get(3)?,
        summary: json_column(row, 4)?,
        model: row.get(5)?,
        meta: json_column(row, 6)?,
        created_at: row.get(7)?,
    })
}

fn select_sql(kind: SummaryKind, filter: &str) -> String {
    format!(
        "SELECT id, session_id, from_turn, to_turn, summary_json, model, meta_json, created_at
         FROM {} WHERE {filter}",
        kind.table()
    )
}

/// Insert a summary unless one already exists for `(session_id, to_turn)`.
///
/// Returns `false` when the uniqueness constraint suppressed the insert, so
/// two racing triggers for the same window leave exactly one row.
pub async fn insert_summary(db: &Database, record: &SummaryRecord) -> Result<bool, HearthError> {
    let summary_json = serde_json::to_string(&record.summary)?;
    let meta_json = serde_json::to_string(&record.meta)?;
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                &format!(
                    "INSERT INTO {} (id, session_id, from_turn, to_turn, summary_json, model, meta_json, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT (session_id, to_turn) DO NOTHING",
                    record.kind.table()
                ),
                params![
                    record.id,
                    record.session_id,
                    record.from_turn,
                    record.to_turn,
                    summary_json,
                    record.model,
                    meta_json,
                    record.created_at,
                ],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a summary of `kind` already covers `to_turn`.
pub async fn summary_exists(
    db: &Database,
    kind: SummaryKind,
    session_id: &str,
    to_turn: i64,
) -> Result<bool, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE session_id = ?1 AND to_turn = ?2)",
                    kind.table()
                ),
                params![sid, to_turn],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Latest summary of `kind` by `to_turn`.
pub async fn latest_summary(
    db: &Database,
    kind: SummaryKind,
    session_id: &str,
) -> Result<Option<SummaryRecord>, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &select_sql(kind, "session_id = ?1 ORDER BY to_turn DESC LIMIT 1"),
                params![sid],
                |row| summary_from_row(kind, row),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Up to `limit` summaries of `kind`, newest window first.
pub async fn list_summaries(
    db: &Database,
    kind: SummaryKind,
    session_id: &str,
    limit: usize,
) -> Result<Vec<SummaryRecord>, HearthError> {
    let sid = session_id.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&select_sql(kind, "session_id = ?1 ORDER BY to_turn DESC LIMIT ?2"))?;
            let rows = stmt.query_map(params![sid, limit], |row| summary_from_row(kind, row))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::ensure_session;
    use hearth_core::SummaryBody;
    use tempfile::tempdir;

    const T0: &str = "2026-01-01T00:00:00.000Z";

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        ensure_session(&db, "s1", "web", T0).await.unwrap();
        (db, dir)
    }

    fn record(kind: SummaryKind, id: &str, from: i64, to: i64) -> SummaryRecord {
        SummaryRecord {
            id: id.to_string(),
            session_id: "s1".to_string(),
            kind,
            from_turn: from,
            to_turn: to,
            summary: SummaryBody {
                goal: format!("goal {to}"),
                state: "ok".into(),
                open_loops: vec!["x".into()],
                constraints: vec![],
                tone_notes: vec!["calm".into()],
            },
            model: "test".into(),
            meta: serde_json::json!({"to_user_turn": 4, "window_user_turn": 4}),
            created_at: T0.into(),
        }
    }

    #[tokio::test]
    async fn duplicate_to_turn_is_suppressed() {
        let (db, _dir) = setup_db().await;

        assert!(insert_summary(&db, &record(SummaryKind::S4, "a", 1, 8)).await.unwrap());
        assert!(!insert_summary(&db, &record(SummaryKind::S4, "b", 1, 8)).await.unwrap());
        assert!(summary_exists(&db, SummaryKind::S4, "s1", 8).await.unwrap());

        // The two series are independent tables.
        assert!(!summary_exists(&db, SummaryKind::S60, "s1", 8).await.unwrap());
        assert!(insert_summary(&db, &record(SummaryKind::S60, "c", 1, 8)).await.unwrap());

        let all = list_summaries(&db, SummaryKind::S4, "s1", 10).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_and_listing_order_by_to_turn() {
        let (db, _dir) = setup_db().await;
        for (id, from, to) in [("a", 1, 8), ("c", 17, 24), ("b", 9, 16)] {
            insert_summary(&db, &record(SummaryKind::S4, id, from, to)).await.unwrap();
        }

        let latest = latest_summary(&db, SummaryKind::S4, "s1").await.unwrap().unwrap();
        assert_eq!(latest.to_turn, 24);
        assert_eq!(latest.summary.goal, "goal 24");
        assert_eq!(latest.meta["window_user_turn"], 4);
        assert_eq!(latest.kind, SummaryKind::S4);

        let listed = list_summaries(&db, SummaryKind::S4, "s1", 2).await.unwrap();
        let tos: Vec<i64> = listed.iter().map(|r| r.to_turn).collect();
        assert_eq!(tos, vec![24, 16]);

        assert!(latest_summary(&db, SummaryKind::S60, "s1").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
