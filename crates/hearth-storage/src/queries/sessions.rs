// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lookup, lazy creation, and proactive-messaging admin.

use hearth_core::{HearthError, Session, SessionStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::queries::text_enum;

const SESSION_COLUMNS: &str = "id, user_id, status, last_turn_id, proactive_enabled,
    silence_threshold_min, silence_cooldown_min, platform, external_id, created_at, updated_at";

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        status: text_enum(row, 2)?,
        last_turn_id: row.get(3)?,
        proactive_enabled: row.get(4)?,
        silence_threshold_min: row.get(5)?,
        silence_cooldown_min: row.get(6)?,
        platform: row.get(7)?,
        external_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) fn get_session_sync(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Session>> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
        params![id],
        session_from_row,
    )
    .optional()
}

/// Return the session, inserting a zeroed one first if it does not exist.
///
/// `platform` is only recorded on creation.
pub async fn ensure_session(
    db: &Database,
    id: &str,
    platform: &str,
    now: &str,
) -> Result<Session, HearthError> {
    let id = id.to_string();
    let platform = platform.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO sessions (id, platform, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![id, platform, now],
            )?;
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, HearthError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| get_session_sync(conn, &id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// List sessions, optionally filtered by status, newest first.
pub async fn list_sessions(
    db: &Database,
    status: Option<SessionStatus>,
) -> Result<Vec<Session>, HearthError> {
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE (?1 IS NULL OR status = ?1)
                 ORDER BY created_at DESC, id ASC"
            ))?;
            let rows = stmt.query_map(params![status], session_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active sessions with proactive messaging switched on.
pub async fn list_proactive_sessions(db: &Database) -> Result<Vec<Session>, HearthError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE proactive_enabled = 1 AND status = 'active'
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([], session_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply one admin update; fails with `SessionNotFound` when no row matched.
async fn update_session(
    db: &Database,
    id: &str,
    sql: &'static str,
    value: rusqlite::types::Value,
    now: &str,
) -> Result<(), HearthError> {
    let owned_id = id.to_string();
    let now = now.to_string();
    let changed = db
        .connection()
        .call(move |conn| conn.execute(sql, params![value, now, owned_id]))
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(HearthError::SessionNotFound(id.to_string()));
    }
    Ok(())
}

/// Toggle proactive messaging for a session.
pub async fn set_proactive(
    db: &Database,
    id: &str,
    enabled: bool,
    now: &str,
) -> Result<(), HearthError> {
    update_session(
        db,
        id,
        "UPDATE sessions SET proactive_enabled = ?1, updated_at = ?2 WHERE id = ?3",
        i64::from(enabled).into(),
        now,
    )
    .await
}

/// Override the silence threshold; `None` restores the configured default.
pub async fn set_silence_threshold(
    db: &Database,
    id: &str,
    minutes: Option<i64>,
    now: &str,
) -> Result<(), HearthError> {
    update_session(
        db,
        id,
        "UPDATE sessions SET silence_threshold_min = ?1, updated_at = ?2 WHERE id = ?3",
        minutes.map_or(rusqlite::types::Value::Null, Into::into),
        now,
    )
    .await
}

/// Override the silence cooldown; `None` restores the configured default.
pub async fn set_silence_cooldown(
    db: &Database,
    id: &str,
    minutes: Option<i64>,
    now: &str,
) -> Result<(), HearthError> {
    update_session(
        db,
        id,
        "UPDATE sessions SET silence_cooldown_min = ?1, updated_at = ?2 WHERE id = ?3",
        minutes.map_or(rusqlite::types::Value::Null, Into::into),
        now,
    )
    .await
}

/// Record the platform-side address used for proactive delivery.
pub async fn set_external_id(
    db: &Database,
    id: &str,
    external_id: Option<&str>,
    now: &str,
) -> Result<(), HearthError> {
    update_session(
        db,
        id,
        "UPDATE sessions SET external_id = ?1, updated_at = ?2 WHERE id = ?3",
        external_id.map_or(rusqlite::types::Value::Null, |s| s.to_string().into()),
        now,
    )
    .await
}

/// Change a session's lifecycle status.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: SessionStatus,
    now: &str,
) -> Result<(), HearthError> {
    update_session(
        db,
        id,
        "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
        status.to_string().into(),
        now,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const T0: &str = "2026-01-01T00:00:00.000Z";
    const T1: &str = "2026-01-01T01:00:00.000Z";

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn ensure_session_creates_once() {
        let (db, _dir) = setup_db().await;

        let first = ensure_session(&db, "s1", "telegram", T0).await.unwrap();
        assert_eq!(first.last_turn_id, 0);
        assert!(!first.proactive_enabled);
        assert_eq!(first.platform, "telegram");
        assert_eq!(first.status, SessionStatus::Active);

        let again = ensure_session(&db, "s1", "web", T1).await.unwrap();
        assert_eq!(again.platform, "telegram");
        assert_eq!(again.created_at, T0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_session_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_session(&db, "nope").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn admin_updates_apply() {
        let (db, _dir) = setup_db().await;
        ensure_session(&db, "s1", "telegram", T0).await.unwrap();

        set_proactive(&db, "s1", true, T1).await.unwrap();
        set_silence_threshold(&db, "s1", Some(30), T1).await.unwrap();
        set_silence_cooldown(&db, "s1", Some(10), T1).await.unwrap();
        set_external_id(&db, "s1", Some("chat-9"), T1).await.unwrap();

        let s = get_session(&db, "s1").await.unwrap().unwrap();
        assert!(s.proactive_enabled);
        assert_eq!(s.silence_threshold_min, Some(30));
        assert_eq!(s.silence_cooldown_min, Some(10));
        assert_eq!(s.external_id.as_deref(), Some("chat-9"));
        assert_eq!(s.updated_at, T1);

        set_silence_threshold(&db, "s1", None, T1).await.unwrap();
        let s = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(s.silence_threshold_min, None);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn admin_update_on_missing_session_fails() {
        let (db, _dir) = setup_db().await;
        let err = set_proactive(&db, "ghost", true, T0).await.unwrap_err();
        assert!(matches!(err, HearthError::SessionNotFound(id) if id == "ghost"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn proactive_listing_skips_disabled_and_archived() {
        let (db, _dir) = setup_db().await;
        for id in ["a", "b", "c"] {
            ensure_session(&db, id, "telegram", T0).await.unwrap();
        }
        set_proactive(&db, "a", true, T0).await.unwrap();
        set_proactive(&db, "c", true, T0).await.unwrap();
        set_status(&db, "c", SessionStatus::Archived, T0).await.unwrap();

        let ids: Vec<String> = list_proactive_sessions(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a"]);

        let archived = list_sessions(&db, Some(SessionStatus::Archived)).await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(list_sessions(&db, None).await.unwrap().len(), 3);

        db.close().await.unwrap();
    }
}
