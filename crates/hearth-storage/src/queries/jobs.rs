// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trigger job queue: cooldown-guarded enqueue, atomic claim with lease,
//! terminal transitions, and lease reaping.

use hearth_core::{HearthError, JobStatus, TriggerJob};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::Database;
use crate::queries::{json_column, text_enum};

const JOB_COLUMNS: &str = "id, session_id, trigger_type, payload_json, status, scheduled_at,
    started_at, finished_at, locked_until, attempts, last_error, created_at";

/// `last_error` written on jobs whose claim lease ran out.
pub const LEASE_EXPIRED: &str = "lease expired";

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriggerJob> {
    Ok(TriggerJob {
        id: row.get(0)?,
        session_id: row.get(1)?,
        trigger_type: text_enum(row, 2)?,
        payload: json_column(row, 3)?,
        status: text_enum(row, 4)?,
        scheduled_at: row.get(5)?,
        started_at: row.get(6)?,
        finished_at: row.get(7)?,
        locked_until: row.get(8)?,
        attempts: row.get(9)?,
        last_error: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Insert `job` unless another job of the same session and trigger type in
/// status queued/running/done was created after `cooldown_cutoff`.
///
/// The check and the insert share one `BEGIN IMMEDIATE` transaction, so two
/// scanners racing on the same session cannot both enqueue. Returns `false`
/// when the cooldown suppressed the insert.
pub async fn enqueue_unless_cooling(
    db: &Database,
    job: &TriggerJob,
    cooldown_cutoff: &str,
) -> Result<bool, HearthError> {
    let payload_json = serde_json::to_string(&job.payload)?;
    let job = job.clone();
    let cutoff = cooldown_cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let cooling: bool = tx.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM trigger_jobs
                     WHERE session_id = ?1 AND trigger_type = ?2
                       AND status IN ('queued', 'running', 'done')
                       AND created_at > ?3)",
                params![job.session_id, job.trigger_type.to_string(), cutoff],
                |row| row.get(0),
            )?;
            if cooling {
                tx.rollback()?;
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO trigger_jobs (id, session_id, trigger_type, payload_json, status,
                     scheduled_at, attempts, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    job.id,
                    job.session_id,
                    job.trigger_type.to_string(),
                    payload_json,
                    job.status.to_string(),
                    job.scheduled_at,
                    job.attempts,
                    job.created_at,
                ],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim the oldest due queued job.
///
/// A single `UPDATE ... WHERE status = 'queued' RETURNING` statement moves
/// the job to running, stamps `started_at` and `locked_until`, and bumps
/// `attempts`. Concurrent claimers never receive the same job.
pub async fn claim_next(
    db: &Database,
    now: &str,
    lease_until: &str,
) -> Result<Option<TriggerJob>, HearthError> {
    let now = now.to_string();
    let lease_until = lease_until.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE trigger_jobs
                     SET status = 'running', started_at = ?1, locked_until = ?2,
                         attempts = attempts + 1
                     WHERE id = (
                         SELECT id FROM trigger_jobs
                         WHERE status = 'queued' AND scheduled_at <= ?1
                         ORDER BY scheduled_at ASC, created_at ASC, id ASC
                         LIMIT 1)
                       AND status = 'queued'
                     RETURNING {JOB_COLUMNS}"
                ),
                params![now, lease_until],
                job_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim one specific job; `None` if it is no longer queued.
pub async fn claim_job(
    db: &Database,
    id: &str,
    now: &str,
    lease_until: &str,
) -> Result<Option<TriggerJob>, HearthError> {
    let id = id.to_string();
    let now = now.to_string();
    let lease_until = lease_until.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE trigger_jobs
                     SET status = 'running', started_at = ?2, locked_until = ?3,
                         attempts = attempts + 1
                     WHERE id = ?1 AND status = 'queued'
                     RETURNING {JOB_COLUMNS}"
                ),
                params![id, now, lease_until],
                job_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a running job to a terminal status and release its lease.
///
/// Returns `false` if the job was not running (already finished or reaped).
pub async fn finish_job(
    db: &Database,
    id: &str,
    status: JobStatus,
    last_error: Option<&str>,
    now: &str,
) -> Result<bool, HearthError> {
    if !status.is_terminal() {
        return Err(HearthError::Internal(format!(
            "finish_job called with non-terminal status {status}"
        )));
    }
    let id = id.to_string();
    let last_error = last_error.map(str::to_string);
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE trigger_jobs
                 SET status = ?1, finished_at = ?2, last_error = ?3, locked_until = NULL
                 WHERE id = ?4 AND status = 'running'",
                params![status.to_string(), now, last_error, id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fail every running job whose lease expired before `now`.
pub async fn reap_expired(db: &Database, now: &str) -> Result<usize, HearthError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE trigger_jobs
                 SET status = 'failed', finished_at = ?1, last_error = ?2, locked_until = NULL
                 WHERE status = 'running' AND locked_until IS NOT NULL AND locked_until < ?1",
                params![now, LEASE_EXPIRED],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a job by ID.
pub async fn get_job(db: &Database, id: &str) -> Result<Option<TriggerJob>, HearthError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM trigger_jobs WHERE id = ?1"),
                params![id],
                job_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Jobs of a session, oldest first.
pub async fn list_jobs(db: &Database, session_id: &str) -> Result<Vec<TriggerJob>, HearthError> {
    let sid = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM trigger_jobs WHERE session_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![sid], job_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of jobs currently in `status`.
pub async fn count_jobs(db: &Database, status: JobStatus) -> Result<i64, HearthError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM trigger_jobs WHERE status = ?1",
                params![status.to_string()],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
