// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: sweeps, session admin, and inspection.

use hearth_core::time::now_timestamp;
use hearth_context::{RankedEvidence, assemble_evidence_text, build_fact_constraint_block, rerank};
use hearth_core::{EvidenceItem, HearthError, Session, SessionStatus, SummaryKind, SummaryRecord};
use hearth_storage::queries::{sessions, summaries};
use serde::Serialize;

use crate::app::App;

/// Latest S4 summaries shown by `hearth summaries`.
const S4_SHOWN: usize = 5;
/// Latest S60 summaries shown by `hearth summaries`.
const S60_SHOWN: usize = 2;

/// Requested changes to a session's proactive settings.
#[derive(Debug, Default)]
pub struct ProactiveUpdate {
    pub enabled: Option<bool>,
    pub threshold_min: Option<i64>,
    pub cooldown_min: Option<i64>,
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RerankReport {
    pub grounding_mode: &'static str,
    pub ranked: Vec<RankedEvidence>,
    pub evidence_text: String,
    pub fact_block: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryListing {
    pub session_id: String,
    pub s4: Vec<SummaryRecord>,
    pub s60: Vec<SummaryRecord>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, HearthError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub async fn scan(app: &App) -> Result<String, HearthError> {
    let created = app.scanner.scan().await?;
    Ok(format!("created {created} job(s)"))
}

pub async fn process(app: &App, limit: Option<usize>) -> Result<String, HearthError> {
    let limit = limit.unwrap_or(app.config.proactive.batch_limit);
    let processed = app.processor.process(limit).await?;
    Ok(format!("processed {processed} job(s)"))
}

/// Apply `update` and return the session as JSON.
///
/// Fails with `SessionNotFound` for an unknown session.
pub async fn proactive(
    app: &App,
    session_id: &str,
    update: ProactiveUpdate,
) -> Result<String, HearthError> {
    let now = now_timestamp();
    if sessions::get_session(&app.db, session_id).await?.is_none() {
        return Err(HearthError::SessionNotFound(session_id.to_string()));
    }
    if let Some(enabled) = update.enabled {
        sessions::set_proactive(&app.db, session_id, enabled, &now).await?;
    }
    if let Some(minutes) = update.threshold_min {
        sessions::set_silence_threshold(&app.db, session_id, Some(minutes), &now).await?;
    }
    if let Some(minutes) = update.cooldown_min {
        sessions::set_silence_cooldown(&app.db, session_id, Some(minutes), &now).await?;
    }
    if let Some(recipient) = update.recipient.as_deref() {
        sessions::set_external_id(&app.db, session_id, Some(recipient), &now).await?;
    }
    let session: Session = sessions::get_session(&app.db, session_id)
        .await?
        .ok_or_else(|| HearthError::SessionNotFound(session_id.to_string()))?;
    to_json(&session)
}

pub async fn list_sessions(app: &App, status: Option<SessionStatus>) -> Result<String, HearthError> {
    to_json(&sessions::list_sessions(&app.db, status).await?)
}

pub async fn set_status(
    app: &App,
    session_id: &str,
    status: SessionStatus,
) -> Result<String, HearthError> {
    sessions::set_status(&app.db, session_id, status, &now_timestamp()).await?;
    Ok(format!("session {session_id} is now {status}"))
}

/// Rank evidence given as a JSON array and render it for a prompt.
///
/// Grounding is `strong` when any evidence survives ranking, `weak` otherwise.
pub fn rerank_evidence(app: &App, input: &str, top_k: Option<i64>) -> Result<String, HearthError> {
    let items: Vec<EvidenceItem> = serde_json::from_str(input)?;
    let config = &app.config.rerank;
    let ranked = rerank(items, top_k.unwrap_or(config.top_k), config);
    let grounding_mode = if ranked.is_empty() { "weak" } else { "strong" };
    let report = RerankReport {
        grounding_mode,
        evidence_text: assemble_evidence_text(&ranked),
        fact_block: build_fact_constraint_block(&ranked, grounding_mode, config.w_fact),
        ranked,
    };
    to_json(&report)
}

pub async fn context(app: &App, session_id: &str, recent: Option<usize>) -> Result<String, HearthError> {
    let recent = recent.unwrap_or(app.config.context.recent_messages);
    let pack = hearth_context::build_context_pack(&app.db, session_id, recent).await?;
    to_json(&pack)
}

pub async fn list_summaries(app: &App, session_id: &str) -> Result<String, HearthError> {
    let listing = SummaryListing {
        session_id: session_id.to_string(),
        s4: summaries::list_summaries(&app.db, SummaryKind::S4, session_id, S4_SHOWN).await?,
        s60: summaries::list_summaries(&app.db, SummaryKind::S60, session_id, S60_SHOWN).await?,
    };
    to_json(&listing)
}

pub async fn append(
    app: &App,
    session_id: &str,
    platform: &str,
    user: &str,
    assistant: &str,
) -> Result<String, HearthError> {
    let appended = app
        .ledger
        .append_exchange(session_id, platform, user, assistant)
        .await?;
    let describe = |outcome: &Option<hearth_context::WindowOutcome>| match outcome {
        Some(hearth_context::WindowOutcome::Created(r)) => {
            format!("created {}..{}", r.from_turn, r.to_turn)
        }
        Some(hearth_context::WindowOutcome::Skipped(reason)) => format!("skipped ({reason})"),
        None => "failed".to_string(),
    };
    Ok(format!(
        "turns {}-{} user_turn={} s4: {} s60: {}",
        appended.user_turn_id,
        appended.assistant_turn_id,
        appended.user_turn,
        describe(&appended.s4),
        describe(&appended.s60),
    ))
}
