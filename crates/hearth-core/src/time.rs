// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp encoding shared by every table.
//!
//! All rows store UTC instants as `%Y-%m-%dT%H:%M:%S%.3fZ`, which sorts
//! lexically in chronological order.

use chrono::{DateTime, Utc};

use crate::error::HearthError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Encode an instant in the storage format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current instant in the storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Decode a stored timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, HearthError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| HearthError::Internal(format!("invalid timestamp `{raw}`: {e}")))
}
