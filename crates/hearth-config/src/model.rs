// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Hearth agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Hearth configuration.
///
/// Built once at startup and never mutated afterwards; components receive
/// the section they need by value or behind an `Arc`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HearthConfig {
    /// Agent identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Turn ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Rolling summary cadences and sanitizer rules.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Evidence reranking weights.
    #[serde(default)]
    pub rerank: RerankConfig,

    /// Silence detection and proactive delivery.
    #[serde(default)]
    pub proactive: ProactiveConfig,

    /// Context pack defaults.
    #[serde(default)]
    pub context: ContextConfig,
}

/// Agent identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "hearth".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("hearth").join("hearth.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("hearth.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Turn ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// How many times an append is re-attempted after losing the
    /// `last_turn_id` race to another writer.
    #[serde(default = "default_append_retries")]
    pub append_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            append_retries: default_append_retries(),
        }
    }
}

fn default_append_retries() -> u32 {
    1
}

/// Rolling summary configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// S4 fires when `user_turn % s4_every == 0`.
    #[serde(default = "default_s4_every")]
    pub s4_every: i64,

    /// Number of user turns covered by an S4 window.
    #[serde(default = "default_s4_window")]
    pub s4_window: i64,

    /// S60 fires when `user_turn % s60_every == 0`.
    #[serde(default = "default_s60_every")]
    pub s60_every: i64,

    /// Number of user turns covered by an S60 window.
    #[serde(default = "default_s60_window")]
    pub s60_window: i64,

    /// Model label recorded on summary rows.
    #[serde(default = "default_summary_model")]
    pub model: String,

    /// Upper bound on a single summarizer call.
    #[serde(default = "default_summary_timeout_secs")]
    pub timeout_secs: u64,

    /// Post-filter rules applied to every summary.
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            s4_every: default_s4_every(),
            s4_window: default_s4_window(),
            s60_every: default_s60_every(),
            s60_window: default_s60_window(),
            model: default_summary_model(),
            timeout_secs: default_summary_timeout_secs(),
            sanitizer: SanitizerConfig::default(),
        }
    }
}

fn default_s4_every() -> i64 {
    4
}

fn default_s4_window() -> i64 {
    4
}

fn default_s60_every() -> i64 {
    30
}

fn default_s60_window() -> i64 {
    30
}

fn default_summary_model() -> String {
    "summarizer_mvp".to_string()
}

fn default_summary_timeout_secs() -> u64 {
    45
}

/// Lexical rule set for suppressing inferred financial-help claims.
///
/// The phrase lists are only enforced when the transcript contains none of
/// the `help_cues`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SanitizerConfig {
    /// Explicit cues that the user really asked for money or help.
    #[serde(default = "default_help_cues")]
    pub help_cues: Vec<String>,

    /// Phrases removed from `goal`.
    #[serde(default = "default_goal_phrases")]
    pub goal_phrases: Vec<String>,

    /// Phrases removed from `state`.
    #[serde(default = "default_state_phrases")]
    pub state_phrases: Vec<String>,

    /// Substring rewrites applied to every open-loop entry.
    #[serde(default = "default_open_loop_rewrites")]
    pub open_loop_rewrites: Vec<RewriteRule>,

    /// Replacement when `goal` is empty after stripping.
    #[serde(default = "default_goal_fallback")]
    pub goal_fallback: String,

    /// Replacement when `state` is empty after stripping.
    #[serde(default = "default_state_fallback")]
    pub state_fallback: String,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            help_cues: default_help_cues(),
            goal_phrases: default_goal_phrases(),
            state_phrases: default_state_phrases(),
            open_loop_rewrites: default_open_loop_rewrites(),
            goal_fallback: default_goal_fallback(),
            state_fallback: default_state_fallback(),
        }
    }
}

/// Substring match and its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_help_cues() -> Vec<String> {
    strings(&[
        "借钱", "借我", "转账", "打钱", "资助", "赞助", "给我钱", "求助", "救济", "能不能给",
        "能否给", "帮我出", "帮我付", "你出钱", "帮我转", "给点钱",
    ])
}

fn default_goal_phrases() -> Vec<String> {
    strings(&[
        "寻求经济上的帮助",
        "寻求经济帮助",
        "请求经济帮助",
        "求助对方",
        "让对方出钱",
    ])
}

fn default_state_phrases() -> Vec<String> {
    strings(&[
        "表示愿意提供帮助",
        "愿意提供帮助",
        "同意提供帮助",
        "已提供帮助",
        "答应提供帮助",
    ])
}

fn default_open_loop_rewrites() -> Vec<RewriteRule> {
    vec![RewriteRule {
        pattern: "需要解决经济困难的具体方案".to_string(),
        replacement: "需要明确下一步安排/计划".to_string(),
    }]
}

fn default_goal_fallback() -> String {
    "概括本段对话的显式主题（若无明确目标则写‘闲聊/状态更新’）".to_string()
}

fn default_state_fallback() -> String {
    "概括当前显式进展（若无进展则写‘无明显推进’）".to_string()
}

/// Evidence reranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RerankConfig {
    /// Fact weight in `score_mix * (1 + w_fact * time_decay * hit_boost)`.
    #[serde(default = "default_w_fact")]
    pub w_fact: f64,

    /// Used when an item carries no time decay.
    #[serde(default = "default_factor")]
    pub default_time_decay: f64,

    /// Used when an item carries no hit boost.
    #[serde(default = "default_factor")]
    pub default_hit_boost: f64,

    /// Items kept after ranking; zero or negative keeps all.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            w_fact: default_w_fact(),
            default_time_decay: default_factor(),
            default_hit_boost: default_factor(),
            top_k: default_top_k(),
        }
    }
}

fn default_w_fact() -> f64 {
    0.2
}

fn default_factor() -> f64 {
    1.0
}

fn default_top_k() -> i64 {
    5
}

/// Silence detection and proactive delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProactiveConfig {
    /// Period of the trigger scanner loop.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Period of the job processor loop.
    #[serde(default = "default_process_interval_secs")]
    pub process_interval_secs: u64,

    /// Jobs claimed per processing pass.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Silence threshold for sessions without their own override.
    #[serde(default = "default_silence_threshold_min")]
    pub default_silence_threshold_min: i64,

    /// Cooldown for sessions without their own override.
    #[serde(default = "default_silence_cooldown_min")]
    pub default_silence_cooldown_min: i64,

    /// Channel name passed to the delivery adapter and stored on outbox rows.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Recipient used when a session has no `external_id`.
    #[serde(default)]
    pub default_recipient: Option<String>,

    /// Longer decision texts keep this many characters plus a `…` marker,
    /// so a truncated text is one character over the limit.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Hard cap on the rendered decision context.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Recent messages included in the decision context.
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,

    #[serde(default = "default_decide_timeout_secs")]
    pub decide_timeout_secs: u64,

    #[serde(default = "default_deliver_timeout_secs")]
    pub deliver_timeout_secs: u64,

    /// Claim lease; running jobs older than this are reaped as failed.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: i64,
}

impl Default for ProactiveConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            process_interval_secs: default_process_interval_secs(),
            batch_limit: default_batch_limit(),
            default_silence_threshold_min: default_silence_threshold_min(),
            default_silence_cooldown_min: default_silence_cooldown_min(),
            channel: default_channel(),
            default_recipient: None,
            max_text_chars: default_max_text_chars(),
            max_context_chars: default_max_context_chars(),
            recent_messages: default_recent_messages(),
            decide_timeout_secs: default_decide_timeout_secs(),
            deliver_timeout_secs: default_deliver_timeout_secs(),
            lease_secs: default_lease_secs(),
        }
    }
}

fn default_scan_interval_secs() -> u64 {
    60
}

fn default_process_interval_secs() -> u64 {
    30
}

fn default_batch_limit() -> usize {
    5
}

fn default_silence_threshold_min() -> i64 {
    240
}

fn default_silence_cooldown_min() -> i64 {
    120
}

fn default_channel() -> String {
    "telegram".to_string()
}

fn default_max_text_chars() -> usize {
    300
}

fn default_max_context_chars() -> usize {
    3500
}

fn default_recent_messages() -> usize {
    6
}

fn default_decide_timeout_secs() -> u64 {
    30
}

fn default_deliver_timeout_secs() -> u64 {
    15
}

fn default_lease_secs() -> i64 {
    300
}

/// Context pack configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Default number of recent messages in a context pack.
    #[serde(default = "default_context_recent")]
    pub recent_messages: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            recent_messages: default_context_recent(),
        }
    }
}

fn default_context_recent() -> usize {
    16
}
