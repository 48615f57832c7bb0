// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Windowed rolling summaries (S4 short series, S60 long series).
//!
//! A window fires when `user_turn % every == 0` and covers the user turns
//! `[max(1, user_turn - window + 1), user_turn]`, including the assistant
//! and system entries that share those user turns. At most one summary per
//! `(session, kind, to_turn)` is ever persisted.

use std::sync::Arc;
use std::time::Duration;

use hearth_config::model::SummaryConfig;
use hearth_core::time::now_timestamp;
use hearth_core::{
    HearthError, Message, PluginAdapter, Summarizer, SummaryBody, SummaryKind, SummaryRecord,
};
use hearth_storage::Database;
use hearth_storage::queries::{messages, summaries};
use tracing::{debug, info, warn};

use crate::sanitizer::Sanitizer;

/// Why a window produced no new summary. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SkipReason {
    /// `user_turn` is not a multiple of the series cadence.
    #[strum(serialize = "not boundary")]
    NotBoundary,
    /// The window selected no messages.
    #[strum(serialize = "no messages")]
    NoMessages,
    /// A summary for this `to_turn` already exists.
    #[strum(serialize = "exists")]
    Exists,
}

/// Result of [`SummaryEngine::maybe_run_window`].
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Created(Box<SummaryRecord>),
    Skipped(SkipReason),
}

impl WindowOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, WindowOutcome::Created(_))
    }
}

/// The generic placeholder stored when no summarizer is available.
///
/// Same shape as real output so downstream readers never special-case it.
pub fn placeholder_summary() -> SummaryBody {
    SummaryBody {
        goal: "当前在推进什么".to_string(),
        state: "进度到哪/现在什么状态".to_string(),
        open_loops: vec!["未完成事项/待决定点".to_string()],
        constraints: vec!["硬约束：工具/时间/边界/要求".to_string()],
        tone_notes: vec!["语气与互动基调提示（很短）".to_string()],
    }
}

/// Flat `role: content` transcript, one message per line.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First user turn of the window ending at `user_turn`.
pub fn window_start(user_turn: i64, window: i64) -> i64 {
    (user_turn - window + 1).max(1)
}

/// Produces and persists S4/S60 summaries.
pub struct SummaryEngine {
    db: Database,
    summarizer: Option<Arc<dyn Summarizer>>,
    config: SummaryConfig,
    sanitizer: Sanitizer,
}

impl SummaryEngine {
    /// `summarizer = None` stores placeholder summaries.
    pub fn new(
        db: Database,
        summarizer: Option<Arc<dyn Summarizer>>,
        config: SummaryConfig,
    ) -> Self {
        let sanitizer = Sanitizer::new(config.sanitizer.clone());
        Self {
            db,
            summarizer,
            config,
            sanitizer,
        }
    }

    /// `(every, window)` for a series.
    pub fn cadence(&self, kind: SummaryKind) -> (i64, i64) {
        match kind {
            SummaryKind::S4 => (self.config.s4_every, self.config.s4_window),
            SummaryKind::S60 => (self.config.s60_every, self.config.s60_window),
        }
    }

    /// Run the `kind` window ending at `user_turn` if it is a boundary.
    pub async fn maybe_run_window(
        &self,
        session_id: &str,
        user_turn: i64,
        kind: SummaryKind,
    ) -> Result<WindowOutcome, HearthError> {
        let (every, _) = self.cadence(kind);
        if user_turn < 1 || every < 1 || user_turn % every != 0 {
            return Ok(WindowOutcome::Skipped(SkipReason::NotBoundary));
        }
        self.run_window(session_id, user_turn, kind).await
    }

    /// Summarize the `kind` window ending at `to_user_turn` regardless of
    /// cadence. Still idempotent on `to_turn`.
    pub async fn run_window(
        &self,
        session_id: &str,
        to_user_turn: i64,
        kind: SummaryKind,
    ) -> Result<WindowOutcome, HearthError> {
        let (_, window) = self.cadence(kind);
        let start = window_start(to_user_turn, window);

        let msgs =
            messages::messages_in_user_turn_range(&self.db, session_id, start, to_user_turn)
                .await?;
        let (Some(first), Some(last)) = (msgs.first(), msgs.last()) else {
            debug!(session_id, %kind, to_user_turn, "window has no messages");
            return Ok(WindowOutcome::Skipped(SkipReason::NoMessages));
        };
        let (from_turn, to_turn) = (first.turn_id, last.turn_id);

        if summaries::summary_exists(&self.db, kind, session_id, to_turn).await? {
            debug!(session_id, %kind, to_turn, "summary already exists");
            return Ok(WindowOutcome::Skipped(SkipReason::Exists));
        }

        let transcript = render_transcript(&msgs);
        let (summary, source) = self.compress(session_id, kind, &transcript).await;

        let record = SummaryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            kind,
            from_turn,
            to_turn,
            summary,
            model: self.config.model.clone(),
            meta: serde_json::json!({
                "to_user_turn": to_user_turn,
                "window_user_turn": window,
                "source": source,
            }),
            created_at: now_timestamp(),
        };

        if !summaries::insert_summary(&self.db, &record).await? {
            debug!(session_id, %kind, to_turn, "lost summary insert race");
            return Ok(WindowOutcome::Skipped(SkipReason::Exists));
        }

        info!(
            session_id,
            kind = %kind,
            from_turn,
            to_turn,
            messages = msgs.len(),
            source,
            "summary window persisted"
        );
        Ok(WindowOutcome::Created(Box::new(record)))
    }

    /// Call the summarizer with a timeout, falling back to the placeholder.
    async fn compress(
        &self,
        session_id: &str,
        kind: SummaryKind,
        transcript: &str,
    ) -> (SummaryBody, &'static str) {
        let Some(summarizer) = &self.summarizer else {
            return (placeholder_summary(), "placeholder");
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let result = tokio::time::timeout(timeout, summarizer.summarize(transcript, kind.level()))
            .await
            .unwrap_or(Err(HearthError::Timeout { duration: timeout }));

        match result {
            Ok(body) => (self.sanitizer.sanitize(transcript, body), "summarizer"),
            Err(e) => {
                warn!(
                    session_id,
                    kind = %kind,
                    summarizer = summarizer.name(),
                    error = %e,
                    "summarizer failed, storing placeholder"
                );
                (placeholder_summary(), "placeholder")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_core::{AdapterType, HealthStatus, Role, SummaryLevel};
    use hearth_storage::NewTurn;
    use hearth_storage::queries::sessions::ensure_session;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const T0: &str = "2026-01-01T00:00:00.000Z";

    enum Behaviour {
        Reply(SummaryBody),
        Fail,
        Hang,
    }

    struct StubSummarizer {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl StubSummarizer {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for StubSummarizer {
        fn name(&self) -> &str {
            "stub"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 1)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Summarizer
        }
        async fn health_check(&self) -> Result<HealthStatus, HearthError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), HearthError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(
            &self,
            _transcript: &str,
            _level: SummaryLevel,
        ) -> Result<SummaryBody, HearthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Reply(body) => Ok(body.clone()),
                Behaviour::Fail => Err(HearthError::provider("model offline")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(SummaryBody::default())
                }
            }
        }
    }

    async fn setup(user_turns: i64) -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        ensure_session(&db, "s1", "web", T0).await.unwrap();
        let mut last = 0;
        for i in 1..=user_turns {
            let written = messages::append_turns(
                &db,
                "s1",
                last,
                vec![
                    NewTurn::new(Role::User, format!("u{i}")),
                    NewTurn::new(Role::Assistant, format!("a{i}")),
                ],
                "web",
                T0,
            )
            .await
            .unwrap();
            last = written[1].turn_id;
        }
        (db, dir)
    }

    fn reply() -> SummaryBody {
        SummaryBody {
            goal: "plan weekend".into(),
            state: "picked a park".into(),
            open_loops: vec!["check weather".into()],
            constraints: vec![],
            tone_notes: vec!["light".into()],
        }
    }

    #[test]
    fn window_bounds() {
        assert_eq!(window_start(4, 4), 1);
        assert_eq!(window_start(8, 4), 5);
        assert_eq!(window_start(2, 30), 1);
    }

    #[test]
    fn transcript_is_role_prefixed_lines() {
        let msg = |turn, role, content: &str| Message {
            id: format!("m{turn}"),
            session_id: "s".into(),
            turn_id: turn,
            user_turn: 1,
            role,
            content: content.into(),
            platform: "web".into(),
            created_at: T0.into(),
        };
        let text = render_transcript(&[msg(1, Role::User, "hi"), msg(2, Role::Assistant, "yo")]);
        assert_eq!(text, "user: hi\nassistant: yo");
    }

    #[tokio::test]
    async fn s4_windows_cover_expected_turns() {
        let (db, _dir) = setup(8).await;
        let engine = SummaryEngine::new(db.clone(), None, SummaryConfig::default());

        let WindowOutcome::Created(first) =
            engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap()
        else {
            panic!("expected summary at user turn 4");
        };
        assert_eq!((first.from_turn, first.to_turn), (1, 8));
        assert_eq!(first.meta["to_user_turn"], 4);
        assert_eq!(first.meta["window_user_turn"], 4);
        assert_eq!(first.meta["source"], "placeholder");
        assert_eq!(first.summary, placeholder_summary());

        let WindowOutcome::Created(second) =
            engine.maybe_run_window("s1", 8, SummaryKind::S4).await.unwrap()
        else {
            panic!("expected summary at user turn 8");
        };
        assert_eq!((second.from_turn, second.to_turn), (9, 16));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn non_boundary_and_empty_windows_skip() {
        let (db, _dir) = setup(3).await;
        let engine = SummaryEngine::new(db.clone(), None, SummaryConfig::default());

        assert_eq!(
            engine.maybe_run_window("s1", 3, SummaryKind::S4).await.unwrap(),
            WindowOutcome::Skipped(SkipReason::NotBoundary)
        );
        assert_eq!(
            engine.maybe_run_window("other", 4, SummaryKind::S4).await.unwrap(),
            WindowOutcome::Skipped(SkipReason::NoMessages)
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_run_is_idempotent_and_skips_compression() {
        let (db, _dir) = setup(4).await;
        let stub = StubSummarizer::new(Behaviour::Reply(reply()));
        let engine = SummaryEngine::new(db.clone(), Some(stub.clone()), SummaryConfig::default());

        assert!(engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap().is_created());
        assert_eq!(
            engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap(),
            WindowOutcome::Skipped(SkipReason::Exists)
        );
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            summaries::list_summaries(&db, SummaryKind::S4, "s1", 10).await.unwrap().len(),
            1
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_triggers_persist_one_row() {
        let (db, _dir) = setup(4).await;
        let engine = Arc::new(SummaryEngine::new(db.clone(), None, SummaryConfig::default()));

        let a = tokio::spawn({
            let engine = engine.clone();
            async move { engine.maybe_run_window("s1", 4, SummaryKind::S4).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            async move { engine.maybe_run_window("s1", 4, SummaryKind::S4).await }
        });
        let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        assert_eq!(outcomes.iter().filter(|o| o.is_created()).count(), 1);
        assert_eq!(
            summaries::list_summaries(&db, SummaryKind::S4, "s1", 10).await.unwrap().len(),
            1
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn summarizer_output_is_stored() {
        let (db, _dir) = setup(4).await;
        let stub = StubSummarizer::new(Behaviour::Reply(reply()));
        let engine = SummaryEngine::new(db.clone(), Some(stub), SummaryConfig::default());

        let WindowOutcome::Created(rec) =
            engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap()
        else {
            panic!("expected summary");
        };
        assert_eq!(rec.summary.goal, "plan weekend");
        assert_eq!(rec.model, "summarizer_mvp");
        assert_eq!(rec.meta["source"], "summarizer");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failing_summarizer_falls_back_to_placeholder() {
        let (db, _dir) = setup(4).await;
        let stub = StubSummarizer::new(Behaviour::Fail);
        let engine = SummaryEngine::new(db.clone(), Some(stub), SummaryConfig::default());

        let WindowOutcome::Created(rec) =
            engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap()
        else {
            panic!("expected placeholder summary");
        };
        assert_eq!(rec.summary, placeholder_summary());
        db.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_summarizer_times_out() {
        let (db, _dir) = setup(4).await;
        let stub = StubSummarizer::new(Behaviour::Hang);
        let config = SummaryConfig {
            timeout_secs: 1,
            ..SummaryConfig::default()
        };
        let engine = SummaryEngine::new(db.clone(), Some(stub), config);

        let outcome = engine.maybe_run_window("s1", 4, SummaryKind::S4).await.unwrap();
        let WindowOutcome::Created(rec) = outcome else {
            panic!("expected placeholder summary");
        };
        assert_eq!(rec.meta["source"], "placeholder");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn s60_is_computed_from_raw_messages() {
        let (db, _dir) = setup(30).await;
        let engine = SummaryEngine::new(db.clone(), None, SummaryConfig::default());

        let WindowOutcome::Created(rec) =
            engine.maybe_run_window("s1", 30, SummaryKind::S60).await.unwrap()
        else {
            panic!("expected S60 summary");
        };
        assert_eq!((rec.from_turn, rec.to_turn), (1, 60));
        assert!(summaries::list_summaries(&db, SummaryKind::S4, "s1", 1).await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
