// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message ledger.

use hearth_core::{HearthError, Message, Role};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;
use crate::queries::text_enum;

const MESSAGE_COLUMNS: &str =
    "id, session_id, turn_id, user_turn, role, content, platform, created_at";

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        turn_id: row.get(2)?,
        user_turn: row.get(3)?,
        role: text_enum(row, 4)?,
        content: row.get(5)?,
        platform: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// One entry to be appended.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub role: Role,
    pub content: String,
}

impl NewTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Append `turns` to a session in one transaction, conditional on the
/// session's `last_turn_id` still being `expected_last_turn`.
///
/// The compare-and-set on `sessions.last_turn_id` is the first write of the
/// transaction. If another writer got there first nothing is written and
/// `HearthError::Conflict` is returned; the caller re-reads and retries.
/// The session row must already exist.
pub async fn append_turns(
    db: &Database,
    session_id: &str,
    expected_last_turn: i64,
    turns: Vec<NewTurn>,
    platform: &str,
    now: &str,
) -> Result<Vec<Message>, HearthError> {
    if turns.is_empty() {
        return Ok(Vec::new());
    }
    let sid = session_id.to_string();
    let platform = platform.to_string();
    let now = now.to_string();
    let new_last = expected_last_turn + turns.len() as i64;

    let appended = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let claimed = tx.execute(
                "UPDATE sessions SET last_turn_id = ?1, updated_at = ?2
                 WHERE id = ?3 AND last_turn_id = ?4",
                params![new_last, now, sid, expected_last_turn],
            )?;
            if claimed == 0 {
                tx.rollback()?;
                return Ok(None);
            }

            let mut user_turn: i64 = tx.query_row(
                "SELECT COALESCE(MAX(user_turn), 0) FROM messages WHERE session_id = ?1",
                params![sid],
                |row| row.get(0),
            )?;

            let mut written = Vec::with_capacity(turns.len());
            for (offset, turn) in turns.into_iter().enumerate() {
                if turn.role == Role::User {
                    user_turn += 1;
                }
                let message = Message {
                    id: uuid::Uuid::new_v4().to_string(),
                    session_id: sid.clone(),
                    turn_id: expected_last_turn + offset as i64 + 1,
                    user_turn,
                    role: turn.role,
                    content: turn.content,
                    platform: platform.clone(),
                    created_at: now.clone(),
                };
                tx.execute(
                    "INSERT INTO messages (id, session_id, turn_id, user_turn, role, content, platform, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        message.id,
                        message.session_id,
                        message.turn_id,
                        message.user_turn,
                        message.role.to_string(),
                        message.content,
                        message.platform,
                        message.created_at,
                    ],
                )?;
                written.push(message);
            }

            tx.commit()?;
            Ok(Some(written))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    appended.ok_or_else(|| HearthError::Conflict {
        session_id: session_id.to_string(),
        expected_last_turn,
    })
}

/// Highest `user_turn` in the session, or 0.
pub async fn max_user_turn(db: &Database, session_id: &str) -> Result<i64, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(MAX(user_turn), 0) FROM messages WHERE session_id = ?1",
                params![sid],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages (any role) whose `user_turn` lies in `[start, end]`, in
/// `turn_id` order.
pub async fn messages_in_user_turn_range(
    db: &Database,
    session_id: &str,
    start: i64,
    end: i64,
) -> Result<Vec<Message>, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1 AND user_turn >= ?2 AND user_turn <= ?3
                 ORDER BY turn_id ASC"
            ))?;
            let rows = stmt.query_map(params![sid, start, end], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The last `limit` messages in chronological order, optionally restricted
/// to a set of roles.
pub async fn recent_messages(
    db: &Database,
    session_id: &str,
    limit: usize,
    roles: Option<&[Role]>,
) -> Result<Vec<Message>, HearthError> {
    let sid = session_id.to_string();
    let role_filter = roles.map(|roles| {
        roles
            .iter()
            .map(|r| format!("'{r}'"))
            .collect::<Vec<_>>()
            .join(", ")
    });
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let role_clause = match &role_filter {
                Some(list) if !list.is_empty() => format!("AND role IN ({list})"),
                Some(_) => "AND 0".to_string(),
                None => String::new(),
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1 {role_clause}
                 ORDER BY turn_id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![sid, limit], message_from_row)?;
            let mut messages = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent `role = user` message, by `turn_id`.
pub async fn last_user_message(
    db: &Database,
    session_id: &str,
) -> Result<Option<Message>, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE session_id = ?1 AND role = 'user'
                     ORDER BY turn_id DESC LIMIT 1"
                ),
                params![sid],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every message of a session in `turn_id` order.
pub async fn list_messages(db: &Database, session_id: &str) -> Result<Vec<Message>, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 ORDER BY turn_id ASC"
            ))?;
            let rows = stmt.query_map(params![sid], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
