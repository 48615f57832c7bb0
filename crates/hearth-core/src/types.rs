// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the ledger, summarization, and proactive pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Summarizer,
    Decider,
    Channel,
}

// --- Ledger ---

/// Author of a ledger entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Lifecycle status of a session. Archival is driven from outside the core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Archived,
}

/// One conversation thread and its counters.
///
/// `last_turn_id` is the high-water mark of the session's message ledger:
/// it always equals the largest `turn_id` stored for the session, or 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub last_turn_id: i64,
    pub proactive_enabled: bool,
    /// Silence threshold in minutes; `None` uses the configured default.
    pub silence_threshold_min: Option<i64>,
    /// Cooldown between silence jobs in minutes; `None` uses the configured default.
    pub silence_cooldown_min: Option<i64>,
    /// Messaging platform the session lives on (telegram, web, ...).
    pub platform: String,
    /// Platform-side address of the conversation, e.g. a chat id.
    pub external_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    /// Gapless per-session sequence number starting at 1.
    pub turn_id: i64,
    /// Advances only on user entries; assistant/system entries inherit it.
    pub user_turn: i64,
    pub role: Role,
    pub content: String,
    pub platform: String,
    pub created_at: String,
}

/// Turn numbers assigned by a single append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAssignment {
    pub turn_id: i64,
    pub user_turn: i64,
}

// --- Summaries ---

/// The two independent rolling-summary series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    S4,
    S60,
}

impl SummaryKind {
    /// Backing table for this series.
    pub fn table(self) -> &'static str {
        match self {
            SummaryKind::S4 => "summaries_s4",
            SummaryKind::S60 => "summaries_s60",
        }
    }

    /// Compression level requested from the summarizer.
    pub fn level(self) -> SummaryLevel {
        match self {
            SummaryKind::S4 => SummaryLevel::Short,
            SummaryKind::S60 => SummaryLevel::Long,
        }
    }
}

/// Compression granularity passed to the summarizer collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SummaryLevel {
    Short,
    Long,
}

/// Structured compression of a window of turns.
///
/// Exactly five fields; anything the summarizer returns is validated into
/// this shape before it is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBody {
    pub goal: String,
    pub state: String,
    pub open_loops: Vec<String>,
    pub constraints: Vec<String>,
    pub tone_notes: Vec<String>,
}

/// A persisted S4 or S60 summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: String,
    pub session_id: String,
    pub kind: SummaryKind,
    /// Inclusive `turn_id` range actually covered by the window.
    pub from_turn: i64,
    pub to_turn: i64,
    pub summary: SummaryBody,
    pub model: String,
    /// Window parameters recorded for audit (`to_user_turn`, `window_user_turn`).
    pub meta: serde_json::Value,
    pub created_at: String,
}

// --- Proactive pipeline ---

/// What caused a trigger job. Only silence detection exists today.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Silence,
}

/// TriggerJob state machine: `queued -> running -> {done | failed | skipped}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Skipped)
    }
}

/// Audit payload captured when the scanner creates a silence job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilencePayload {
    pub silence_minutes: f64,
    pub threshold_minutes: i64,
    pub cooldown_minutes: i64,
}

/// A unit of proactive-messaging work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerJob {
    pub id: String,
    pub session_id: String,
    pub trigger_type: TriggerType,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub scheduled_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Claim lease; a `running` job past this instant is considered abandoned.
    pub locked_until: Option<String>,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// Outcome of the external decision function.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Send,
    Skip,
}

/// Result of `decide(trigger_type, session_id, context)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutput {
    pub decision: Decision,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "unknown_model")]
    pub model: String,
}

fn unknown_model() -> String {
    "unknown".to_string()
}

impl DecisionOutput {
    /// A skip decision carrying only a reason.
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Skip,
            text: String::new(),
            reason: reason.into(),
            model: unknown_model(),
        }
    }
}

/// Delivery state of an outbox row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

/// Durable record of what was (or would have been) sent for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: String,
    pub job_id: String,
    pub channel: String,
    pub recipient: Option<String>,
    pub decision: Decision,
    /// `None` whenever `decision` is skip.
    pub message_text: Option<String>,
    pub status: OutboxStatus,
    pub sent_at: Option<String>,
    pub model_trace: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

// --- Retrieval ---

/// A retrieved snippet with the relevance signals used for reranking.
///
/// Produced per request by retrieval collaborators and never persisted.
/// Missing scores are filled with defaults at rerank time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default, alias = "content", alias = "snippet", alias = "chunk")]
    pub text: String,
    #[serde(default, alias = "type")]
    pub source: String,
    #[serde(default, alias = "vector_score", alias = "score")]
    pub score_vec: Option<f64>,
    #[serde(default, alias = "keyword_score", alias = "bm25_score")]
    pub score_key: Option<f64>,
    #[serde(default, alias = "d_time", alias = "D_time")]
    pub time_decay: Option<f64>,
    #[serde(default, alias = "b_hits", alias = "B_hits")]
    pub hit_boost: Option<f64>,
}

impl EvidenceItem {
    /// Evidence with a text body and source label and no scores yet.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            ..Self::default()
        }
    }
}
