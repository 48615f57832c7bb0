// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn ledger: gapless per-session `turn_id` assignment with optimistic
//! concurrency on `sessions.last_turn_id`.
//!
//! Each append reads the session's high-water mark and writes conditionally
//! on it. A concurrent writer that got there first surfaces as
//! [`HearthError::Conflict`], which is retried up to
//! `ledger.append_retries` times with a fresh read.

use std::sync::Arc;

use hearth_config::model::LedgerConfig;
use hearth_context::{SummaryEngine, WindowOutcome};
use hearth_core::time::now_timestamp;
use hearth_core::{HearthError, Message, Role, SummaryKind, TurnAssignment};
use hearth_storage::queries::{messages, sessions};
use hearth_storage::{Database, NewTurn};
use tracing::{debug, warn};

/// Platform recorded for sessions created without one.
pub const DEFAULT_PLATFORM: &str = "unknown";

/// Result of [`TurnLedger::append_exchange`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeAppended {
    pub session_id: String,
    pub user_turn_id: i64,
    pub assistant_turn_id: i64,
    pub user_turn: i64,
    /// `None` when the S4 window check itself failed.
    pub s4: Option<WindowOutcome>,
    /// `None` when the S60 window check itself failed.
    pub s60: Option<WindowOutcome>,
}

/// Append path for conversation turns.
pub struct TurnLedger {
    db: Database,
    config: LedgerConfig,
    summaries: Arc<SummaryEngine>,
}

impl TurnLedger {
    pub fn new(db: Database, config: LedgerConfig, summaries: Arc<SummaryEngine>) -> Self {
        Self {
            db,
            config,
            summaries,
        }
    }

    /// Append one entry, creating the session if needed.
    pub async fn append_turn(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<TurnAssignment, HearthError> {
        self.append_turn_at(session_id, DEFAULT_PLATFORM, role, content, &now_timestamp())
            .await
    }

    pub async fn append_turn_at(
        &self,
        session_id: &str,
        platform: &str,
        role: Role,
        content: &str,
        now: &str,
    ) -> Result<TurnAssignment, HearthError> {
        let written = self
            .append_with_retry(session_id, platform, vec![NewTurn::new(role, content)], now)
            .await?;
        written
            .first()
            .map(|m| TurnAssignment {
                turn_id: m.turn_id,
                user_turn: m.user_turn,
            })
            .ok_or_else(|| HearthError::Internal("append wrote no rows".to_string()))
    }

    /// Append a user message and the assistant reply as one transaction,
    /// then run the S4 and S60 window checks for the new user turn.
    ///
    /// Summarization failures are logged and never fail the append.
    pub async fn append_exchange(
        &self,
        session_id: &str,
        platform: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<ExchangeAppended, HearthError> {
        self.append_exchange_at(session_id, platform, user_text, assistant_text, &now_timestamp())
            .await
    }

    pub async fn append_exchange_at(
        &self,
        session_id: &str,
        platform: &str,
        user_text: &str,
        assistant_text: &str,
        now: &str,
    ) -> Result<ExchangeAppended, HearthError> {
        let turns = vec![
            NewTurn::new(Role::User, user_text),
            NewTurn::new(Role::Assistant, assistant_text),
        ];
        let written = self.append_with_retry(session_id, platform, turns, now).await?;
        let [user, assistant] = written.as_slice() else {
            return Err(HearthError::Internal(format!(
                "exchange append wrote {} rows",
                written.len()
            )));
        };

        let user_turn = user.user_turn;
        let s4 = self.check_window(session_id, user_turn, SummaryKind::S4).await;
        let s60 = self.check_window(session_id, user_turn, SummaryKind::S60).await;

        Ok(ExchangeAppended {
            session_id: session_id.to_string(),
            user_turn_id: user.turn_id,
            assistant_turn_id: assistant.turn_id,
            user_turn,
            s4,
            s60,
        })
    }

    /// Run one summary window check, swallowing and logging its failure.
    pub async fn check_window(
        &self,
        session_id: &str,
        user_turn: i64,
        kind: SummaryKind,
    ) -> Option<WindowOutcome> {
        match self.summaries.maybe_run_window(session_id, user_turn, kind).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(session_id, %kind, user_turn, error = %e, "summary window failed");
                None
            }
        }
    }

    async fn append_with_retry(
        &self,
        session_id: &str,
        platform: &str,
        turns: Vec<NewTurn>,
        now: &str,
    ) -> Result<Vec<Message>, HearthError> {
        let mut retries = 0;
        loop {
            let session = sessions::ensure_session(&self.db, session_id, platform, now).await?;
            let result = messages::append_turns(
                &self.db,
                session_id,
                session.last_turn_id,
                turns.clone(),
                platform,
                now,
            )
            .await;

            match result {
                Err(e) if e.is_conflict() && retries < self.config.append_retries => {
                    retries += 1;
                    debug!(session_id, retries, "append conflicted, retrying");
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_config::model::SummaryConfig;
    use hearth_context::SkipReason;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn ledger(db: &Database, retries: u32) -> TurnLedger {
        let engine = Arc::new(SummaryEngine::new(db.clone(), None, SummaryConfig::default()));
        TurnLedger::new(
            db.clone(),
            LedgerConfig {
                append_retries: retries,
            },
            engine,
        )
    }

    #[tokio::test]
    async fn assigns_turn_and_user_turn() {
        let (db, _dir) = setup_db().await;
        let ledger = ledger(&db, 1);

        let a = ledger.append_turn("s1", Role::User, "hi").await.unwrap();
        let b = ledger.append_turn("s1", Role::Assistant, "hello").await.unwrap();
        let c = ledger.append_turn("s1", Role::System, "note").await.unwrap();
        let d = ledger.append_turn("s1", Role::User, "again").await.unwrap();

        assert_eq!((a.turn_id, a.user_turn), (1, 1));
        assert_eq!((b.turn_id, b.user_turn), (2, 1));
        assert_eq!((c.turn_id, c.user_turn), (3, 1));
        assert_eq!((d.turn_id, d.user_turn), (4, 2));

        let session = sessions::get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.last_turn_id, 4);
        assert_eq!(session.platform, DEFAULT_PLATFORM);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assistant_first_stays_on_user_turn_zero() {
        let (db, _dir) = setup_db().await;
        let ledger = ledger(&db, 1);
        let a = ledger.append_turn("s1", Role::Assistant, "welcome").await.unwrap();
        assert_eq!((a.turn_id, a.user_turn), (1, 0));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn exchange_triggers_s4_on_boundary() {
        let (db, _dir) = setup_db().await;
        let ledger = ledger(&db, 1);

        for i in 1..=3 {
            let out = ledger
                .append_exchange("s1", "telegram", &format!("u{i}"), &format!("a{i}"))
                .await
                .unwrap();
            assert_eq!(out.s4, Some(WindowOutcome::Skipped(SkipReason::NotBoundary)));
        }
        let fourth = ledger.append_exchange("s1", "telegram", "u4", "a4").await.unwrap();
        assert_eq!((fourth.user_turn_id, fourth.assistant_turn_id), (7, 8));
        assert_eq!(fourth.user_turn, 4);
        let Some(WindowOutcome::Created(summary)) = fourth.s4 else {
            panic!("expected S4 at user turn 4");
        };
        assert_eq!((summary.from_turn, summary.to_turn), (1, 8));
        assert_eq!(fourth.s60, Some(WindowOutcome::Skipped(SkipReason::NotBoundary)));

        let session = sessions::get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.platform, "telegram");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_writers_keep_turn_ids_gapless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let path = path.to_str().unwrap();
        // Two handles are two independent writer threads on the same file.
        let db_a = Database::open(path).await.unwrap();
        let db_b = Database::open(path).await.unwrap();
        let ledger_a = Arc::new(ledger(&db_a, 50));
        let ledger_b = Arc::new(ledger(&db_b, 50));

        let mut handles = Vec::new();
        for (i, ledger) in [ledger_a, ledger_b].into_iter().enumerate() {
            handles.push(tokio::spawn(async move {
                for n in 0..20 {
                    ledger
                        .append_turn("s1", Role::User, &format!("w{i}-{n}"))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = messages::list_messages(&db_a, "s1").await.unwrap();
        let turn_ids: Vec<i64> = all.iter().map(|m| m.turn_id).collect();
        assert_eq!(turn_ids, (1..=40).collect::<Vec<_>>());
        let user_turns: Vec<i64> = all.iter().map(|m| m.user_turn).collect();
        assert_eq!(user_turns, (1..=40).collect::<Vec<_>>());
        db_a.close().await.unwrap();
        db_b.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_expectation_conflicts_without_writing() {
        let (db, _dir) = setup_db().await;
        sessions::ensure_session(&db, "s1", "web", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        // Stale expectation: the session is at 0, not 5.
        let err = messages::append_turns(
            &db,
            "s1",
            5,
            vec![NewTurn::new(Role::User, "late")],
            "web",
            "2026-01-01T00:00:00.000Z",
        )
        .await
        .unwrap_err();
        assert!(err.is_conflict());
        assert!(messages::list_messages(&db, "s1").await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
