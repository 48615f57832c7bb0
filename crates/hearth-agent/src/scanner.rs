// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic silence sweep over sessions with proactive messaging enabled.

use chrono::{DateTime, Duration, Utc};
use hearth_config::model::ProactiveConfig;
use hearth_core::time::{format_timestamp, parse_timestamp};
use hearth_core::{HearthError, JobStatus, Session, SilencePayload, TriggerJob, TriggerType};
use hearth_storage::Database;
use hearth_storage::queries::{jobs, messages, sessions};
use tracing::{debug, info, warn};

/// Creates silence trigger jobs.
pub struct TriggerScanner {
    db: Database,
    config: ProactiveConfig,
}

impl TriggerScanner {
    pub fn new(db: Database, config: ProactiveConfig) -> Self {
        Self { db, config }
    }

    /// One sweep at the current instant. Returns the number of jobs created.
    pub async fn scan(&self) -> Result<usize, HearthError> {
        self.scan_at(Utc::now()).await
    }

    /// One sweep as of `now`.
    ///
    /// Only listing the sessions can fail the sweep; a failing session is
    /// logged and skipped.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> Result<usize, HearthError> {
        let candidates = sessions::list_proactive_sessions(&self.db).await?;
        let mut created = 0;
        for session in &candidates {
            match self.scan_session(session, now).await {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "silence scan failed for session");
                }
            }
        }
        if created > 0 {
            info!(sessions = candidates.len(), created, "silence scan enqueued jobs");
        } else {
            debug!(sessions = candidates.len(), "silence scan found nothing to enqueue");
        }
        Ok(created)
    }

    async fn scan_session(&self, session: &Session, now: DateTime<Utc>) -> Result<bool, HearthError> {
        let Some(last_user) = messages::last_user_message(&self.db, &session.id).await? else {
            return Ok(false);
        };

        let silence = now - parse_timestamp(&last_user.created_at)?;
        let silence_minutes = silence.num_milliseconds() as f64 / 60_000.0;
        let threshold = session
            .silence_threshold_min
            .unwrap_or(self.config.default_silence_threshold_min);
        if silence_minutes < threshold as f64 {
            return Ok(false);
        }

        let cooldown = session
            .silence_cooldown_min
            .unwrap_or(self.config.default_silence_cooldown_min);
        let cutoff = format_timestamp(now - Duration::minutes(cooldown));

        let payload = SilencePayload {
            silence_minutes: (silence_minutes * 10.0).round() / 10.0,
            threshold_minutes: threshold,
            cooldown_minutes: cooldown,
        };
        let now_str = format_timestamp(now);
        let job = TriggerJob {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            trigger_type: TriggerType::Silence,
            payload: serde_json::to_value(&payload)?,
            status: JobStatus::Queued,
            scheduled_at: now_str.clone(),
            started_at: None,
            finished_at: None,
            locked_until: None,
            attempts: 0,
            last_error: None,
            created_at: now_str,
        };

        let enqueued = jobs::enqueue_unless_cooling(&self.db, &job, &cutoff).await?;
        if enqueued {
            info!(
                session_id = %session.id,
                job_id = %job.id,
                silence_minutes = payload.silence_minutes,
                threshold,
                "silence trigger queued"
            );
        } else {
            debug!(session_id = %session.id, cooldown, "silence trigger cooling down");
        }
        Ok(enqueued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hearth_core::Role;
    use hearth_storage::NewTurn;
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn seed(db: &Database, id: &str, proactive: bool) {
        let at = format_timestamp(t0());
        sessions::ensure_session(db, id, "telegram", &at).await.unwrap();
        messages::append_turns(
            db,
            id,
            0,
            vec![NewTurn::new(Role::User, "night"), NewTurn::new(Role::Assistant, "sleep well")],
            "telegram",
            &at,
        )
        .await
        .unwrap();
        sessions::set_proactive(db, id, proactive, &at).await.unwrap();
    }

    fn scanner(db: &Database) -> TriggerScanner {
        TriggerScanner::new(db.clone(), ProactiveConfig::default())
    }

    #[tokio::test]
    async fn threshold_is_respected() {
        let (db, _dir) = setup_db().await;
        seed(&db, "s1", true).await;
        let scanner = scanner(&db);

        assert_eq!(scanner.scan_at(t0() + Duration::minutes(239)).await.unwrap(), 0);
        assert_eq!(scanner.scan_at(t0() + Duration::minutes(241)).await.unwrap(), 1);

        let jobs = jobs::list_jobs(&db, "s1").await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Queued);
        let payload: SilencePayload = serde_json::from_value(jobs[0].payload.clone()).unwrap();
        assert_eq!(payload.silence_minutes, 241.0);
        assert_eq!(payload.threshold_minutes, 240);
        assert_eq!(payload.cooldown_minutes, 120);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cooldown_suppresses_second_job() {
        let (db, _dir) = setup_db().await;
        seed(&db, "s1", true).await;
        let scanner = scanner(&db);

        assert_eq!(scanner.scan_at(t0() + Duration::minutes(241)).await.unwrap(), 1);
        assert_eq!(scanner.scan_at(t0() + Duration::minutes(300)).await.unwrap(), 0);
        // 241 + 120 cooldown
        assert_eq!(scanner.scan_at(t0() + Duration::minutes(362)).await.unwrap(), 1);
        assert_eq!(jobs::list_jobs(&db, "s1").await.unwrap().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn per_session_overrides_apply() {
        let (db, _dir) = setup_db().await;
        seed(&db, "s1", true).await;
        let at = format_timestamp(t0());
        sessions::set_silence_threshold(&db, "s1", Some(30), &at).await.unwrap();
        sessions::set_silence_cooldown(&db, "s1", Some(10), &at).await.unwrap();
        let scanner = scanner(&db);

        assert_eq!(scanner.scan_at(t0() + Duration::minutes(31)).await.unwrap(), 1);
        assert_eq!(scanner.scan_at(t0() + Duration::minutes(35)).await.unwrap(), 0);
        assert_eq!(scanner.scan_at(t0() + Duration::minutes(42)).await.unwrap(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn disabled_and_silent_sessions_are_ignored() {
        let (db, _dir) = setup_db().await;
        seed(&db, "off", false).await;
        let at = format_timestamp(t0());
        sessions::ensure_session(&db, "empty", "web", &at).await.unwrap();
        sessions::set_proactive(&db, "empty", true, &at).await.unwrap();

        let n = scanner(&db).scan_at(t0() + Duration::days(2)).await.unwrap();
        assert_eq!(n, 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_scanners_enqueue_once() {
        let (db, _dir) = setup_db().await;
        seed(&db, "s1", true).await;
        let a = scanner(&db);
        let b = scanner(&db);
        let now = t0() + Duration::minutes(250);

        let (ra, rb) = tokio::join!(a.scan_at(now), b.scan_at(now));
        assert_eq!(ra.unwrap() + rb.unwrap(), 1);
        db.close().await.unwrap();
    }
}
