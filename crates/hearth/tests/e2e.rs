// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the ledger -> summaries -> scan -> process pipeline.
//!
//! Each test builds an isolated TestHarness with a temp SQLite database and
//! mock collaborators. Tests are independent and order-insensitive.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hearth_context::WindowOutcome;
use hearth_core::time::format_timestamp;
use hearth_core::{
    Decision, DecisionOutput, JobStatus, OutboxStatus, SummaryBody, SummaryKind, SummaryLevel,
};
use hearth_storage::queries::{jobs, outbox, sessions, summaries};
use hearth_test_utils::TestHarness;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 21, 0, 0).unwrap()
}

fn send(text: &str) -> DecisionOutput {
    DecisionOutput {
        decision: Decision::Send,
        text: text.to_string(),
        reason: "long silence".to_string(),
        model: "mock-llm".to_string(),
    }
}

async fn chat(harness: &TestHarness, session_id: &str, exchanges: i64) {
    let at = format_timestamp(t0());
    for i in 1..=exchanges {
        harness
            .ledger
            .append_exchange_at(
                session_id,
                "telegram",
                &format!("user says {i}"),
                &format!("assistant says {i}"),
                &at,
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn silence_leads_to_a_delivered_check_in() {
    let harness = TestHarness::builder()
        .with_decisions(vec![send("still up? how did the interview go")])
        .with_summary_reply(SummaryBody {
            goal: "prepare for interview".into(),
            state: "practised answers".into(),
            ..SummaryBody::default()
        })
        .build()
        .await
        .unwrap();

    chat(&harness, "s1", 4).await;
    let at = format_timestamp(t0());
    sessions::set_proactive(&harness.db, "s1", true, &at).await.unwrap();
    sessions::set_external_id(&harness.db, "s1", Some("chat-7"), &at)
        .await
        .unwrap();

    let later = t0() + Duration::minutes(241);
    assert_eq!(harness.scanner.scan_at(later).await.unwrap(), 1);
    assert_eq!(harness.processor.process_at(5, later).await.unwrap(), 1);

    let sent = harness.mock_channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "chat-7");
    assert_eq!(sent[0].text, "still up? how did the interview go");

    let job = &jobs::list_jobs(&harness.db, "s1").await.unwrap()[0];
    assert_eq!(job.status, JobStatus::Done);
    let rows = outbox::outbox_for_job(&harness.db, &job.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, OutboxStatus::Sent);
    assert_eq!(rows[0].model_trace["model"], "mock-llm");

    let calls = harness.mock_decider.calls().await;
    assert!(calls[0].context.contains("[S4 latest]"));
    assert!(calls[0].context.contains("prepare for interview"));
    assert!(calls[0].context.contains("U4: user says 4"));

    // Cooldown: a second sweep shortly after finds nothing new.
    assert_eq!(
        harness.scanner.scan_at(later + Duration::minutes(5)).await.unwrap(),
        0
    );
    harness.close().await.unwrap();
}

#[tokio::test]
async fn skipped_decision_still_finishes_the_job() {
    let harness = TestHarness::builder().build().await.unwrap();
    chat(&harness, "s1", 1).await;
    let at = format_timestamp(t0());
    sessions::set_proactive(&harness.db, "s1", true, &at).await.unwrap();

    let later = t0() + Duration::hours(5);
    harness.scanner.scan_at(later).await.unwrap();
    // No scripted decisions: the mock skips.
    harness.processor.process_at(5, later).await.unwrap();

    let job = &jobs::list_jobs(&harness.db, "s1").await.unwrap()[0];
    assert!(job.status.is_terminal());
    assert_eq!(jobs::count_jobs(&harness.db, JobStatus::Running).await.unwrap(), 0);
    let rows = outbox::outbox_for_job(&harness.db, &job.id).await.unwrap();
    assert_eq!(rows[0].decision, Decision::Skip);
    assert_eq!(harness.mock_channel.sent_count().await, 0);
    harness.close().await.unwrap();
}

#[tokio::test]
async fn thirty_exchanges_produce_both_series() {
    let harness = TestHarness::builder()
        .with_summary_reply(SummaryBody {
            goal: "chat".into(),
            state: "ongoing".into(),
            ..SummaryBody::default()
        })
        .build()
        .await
        .unwrap();

    chat(&harness, "s1", 30).await;

    let s4 = summaries::list_summaries(&harness.db, SummaryKind::S4, "s1", 100)
        .await
        .unwrap();
    let s60 = summaries::list_summaries(&harness.db, SummaryKind::S60, "s1", 100)
        .await
        .unwrap();
    assert_eq!(s4.len(), 7);
    assert_eq!(s60.len(), 1);
    assert_eq!((s4[0].from_turn, s4[0].to_turn), (49, 56));
    assert_eq!((s60[0].from_turn, s60[0].to_turn), (1, 60));

    let summarizer = harness.mock_summarizer.as_ref().unwrap();
    let levels: Vec<SummaryLevel> = summarizer
        .transcripts()
        .await
        .into_iter()
        .map(|(level, _)| level)
        .collect();
    assert_eq!(levels.iter().filter(|l| **l == SummaryLevel::Short).count(), 7);
    assert_eq!(levels.last(), Some(&SummaryLevel::Long));
    harness.close().await.unwrap();
}

#[tokio::test]
async fn invented_help_requests_are_scrubbed() {
    let harness = TestHarness::builder()
        .with_summary_reply(SummaryBody {
            goal: "寻求经济帮助".into(),
            state: "聊了晚饭".into(),
            ..SummaryBody::default()
        })
        .build()
        .await
        .unwrap();

    chat(&harness, "s1", 4).await;
    let latest = summaries::latest_summary(&harness.db, SummaryKind::S4, "s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.summary.goal, harness.config.summary.sanitizer.goal_fallback);
    assert_eq!(latest.summary.state, "聊了晚饭");
    harness.close().await.unwrap();
}

#[tokio::test]
async fn replayed_window_is_a_no_op() {
    let harness = TestHarness::builder().build().await.unwrap();
    chat(&harness, "s1", 4).await;

    let again = harness
        .summaries
        .maybe_run_window("s1", 4, SummaryKind::S4)
        .await
        .unwrap();
    assert!(matches!(again, WindowOutcome::Skipped(_)));
    assert_eq!(
        summaries::list_summaries(&harness.db, SummaryKind::S4, "s1", 10)
            .await
            .unwrap()
            .len(),
        1
    );
    harness.close().await.unwrap();
}
