// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.
//!
//! Every function takes `&Database` and runs a single closure on the writer
//! thread, so each function is atomic with respect to other callers on the
//! same handle.

pub mod jobs;
pub mod messages;
pub mod outbox;
pub mod sessions;
pub mod summaries;

use std::str::FromStr;

use rusqlite::types::Type;

/// Parse a TEXT column into a strum enum, surfacing bad values as a
/// conversion failure on that column.
pub(crate) fn text_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a TEXT column holding JSON.
pub(crate) fn json_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
