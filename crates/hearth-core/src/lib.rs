// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hearth companion agent.
//!
//! This crate provides the error type, the domain types of the turn ledger
//! and proactive pipeline, and the collaborator traits that storage,
//! summarization, decision, and delivery backends implement.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use error::HearthError;
pub use types::{
    AdapterType, Decision, DecisionOutput, EvidenceItem, HealthStatus, JobStatus, Message,
    OutboxMessage, OutboxStatus, Role, Session, SessionStatus, SilencePayload, SummaryBody,
    SummaryKind, SummaryLevel, SummaryRecord, TriggerJob, TriggerType, TurnAssignment,
};

pub use traits::{
    ChannelAdapter, Decider, PluginAdapter, StorageAdapter, Summarizer, parse_summary_json,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn hearth_error_has_all_variants() {
        let _config = HearthError::Config("test".into());
        let _storage = HearthError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let conflict = HearthError::Conflict {
            session_id: "s".into(),
            expected_last_turn: 3,
        };
        assert!(conflict.is_conflict());
        let _missing = HearthError::SessionNotFound("s".into());
        let provider = HearthError::provider("down");
        assert!(!provider.is_conflict());
        let _channel = HearthError::channel("no route");
        let _validation = HearthError::Validation("bad".into());
        let _timeout = HearthError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = HearthError::Internal("test".into());
    }

    #[test]
    fn status_enums_use_lowercase_wire_names() {
        assert_eq!(JobStatus::Queued.to_string(), "queued");
        assert_eq!(JobStatus::from_str("skipped").unwrap(), JobStatus::Skipped);
        assert_eq!(OutboxStatus::Sent.to_string(), "sent");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
        assert_eq!(SummaryKind::S60.to_string(), "s60");
        assert_eq!(TriggerType::Silence.to_string(), "silence");
        assert!(Role::from_str("narrator").is_err());
    }

    #[test]
    fn terminal_job_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Skipped.is_terminal());
    }

    #[test]
    fn summary_kinds_map_to_tables_and_levels() {
        assert_eq!(SummaryKind::S4.table(), "summaries_s4");
        assert_eq!(SummaryKind::S60.table(), "summaries_s60");
        assert_eq!(SummaryKind::S4.level(), SummaryLevel::Short);
        assert_eq!(SummaryKind::S60.level(), SummaryLevel::Long);
    }

    #[test]
    fn evidence_accepts_retrieval_aliases() {
        let item: EvidenceItem = serde_json::from_value(serde_json::json!({
            "content": "likes green tea",
            "type": "memory",
            "vector_score": 0.9,
            "bm25_score": 0.4,
            "D_time": 0.5,
            "b_hits": 2.0
        }))
        .unwrap();
        assert_eq!(item.text, "likes green tea");
        assert_eq!(item.source, "memory");
        assert_eq!(item.score_vec, Some(0.9));
        assert_eq!(item.score_key, Some(0.4));
        assert_eq!(item.time_decay, Some(0.5));
        assert_eq!(item.hit_boost, Some(2.0));
    }

    #[test]
    fn decision_output_defaults_model_to_unknown() {
        let out: DecisionOutput =
            serde_json::from_value(serde_json::json!({"decision": "skip"})).unwrap();
        assert_eq!(out.decision, Decision::Skip);
        assert_eq!(out.model, "unknown");
        assert!(out.text.is_empty());
    }
}
