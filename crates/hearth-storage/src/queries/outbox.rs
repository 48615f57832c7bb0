// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox rows recording each delivery decision and its outcome.

use hearth_core::{HearthError, OutboxMessage, OutboxStatus};
use rusqlite::params;

use crate::database::Database;
use crate::queries::{json_column, text_enum};

const OUTBOX_COLUMNS: &str = "id, job_id, channel, recipient, decision, message_text, status,
    sent_at, model_trace_json, created_at, updated_at";

fn outbox_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OutboxMessage> {
    Ok(OutboxMessage {
        id: row.get(0)?,
        job_id: row.get(1)?,
        channel: row.get(2)?,
        recipient: row.get(3)?,
        decision: text_enum(row, 4)?,
        message_text: row.get(5)?,
        status: text_enum(row, 6)?,
        sent_at: row.get(7)?,
        model_trace: json_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Persist a new outbox row.
pub async fn insert_outbox(db: &Database, message: &OutboxMessage) -> Result<(), HearthError> {
    let trace_json = serde_json::to_string(&message.model_trace)?;
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO outbox_messages (id, job_id, channel, recipient, decision,
                     message_text, status, sent_at, model_trace_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    message.id,
                    message.job_id,
                    message.channel,
                    message.recipient,
                    message.decision.to_string(),
                    message.message_text,
                    message.status.to_string(),
                    message.sent_at,
                    trace_json,
                    message.created_at,
                    message.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a pending row to its terminal status.
///
/// Terminal rows are never touched again; returns `false` if the row was
/// not pending.
pub async fn resolve_outbox(
    db: &Database,
    id: &str,
    status: OutboxStatus,
    sent_at: Option<&str>,
    model_trace: &serde_json::Value,
    now: &str,
) -> Result<bool, HearthError> {
    let trace_json = serde_json::to_string(model_trace)?;
    let id = id.to_string();
    let sent_at = sent_at.map(str::to_string);
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE outbox_messages
                 SET status = ?1, sent_at = ?2, model_trace_json = ?3, updated_at = ?4
                 WHERE id = ?5 AND status = 'pending'",
                params![status.to_string(), sent_at, trace_json, now, id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Outbox rows written for a job, oldest first.
pub async fn outbox_for_job(db: &Database, job_id: &str) -> Result<Vec<OutboxMessage>, HearthError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM outbox_messages WHERE job_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![job_id], outbox_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
