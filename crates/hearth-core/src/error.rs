// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hearth agent core.

use thiserror::Error;

/// The primary error type used across all Hearth adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HearthError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A concurrent writer advanced the session's `last_turn_id` first.
    #[error("turn ledger conflict on session {session_id}: last_turn_id moved past {expected_last_turn}")]
    Conflict {
        session_id: String,
        expected_last_turn: i64,
    },

    /// The referenced session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Summarizer or decider collaborator failure (unavailable, HTTP error, bad payload).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Delivery channel failure (missing recipient, transport error).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Collaborator output failed validation at the boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for the optimistic-concurrency conflict variant.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<serde_json::Error> for HearthError {
    fn from(e: serde_json::Error) -> Self {
        HearthError::Storage {
            source: Box::new(e),
        }
    }
}
