// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compression function seam and the boundary validator for its output.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HearthError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SummaryBody, SummaryLevel};

/// Compresses a flat transcript into a [`SummaryBody`].
///
/// Implementations must summarize only what the transcript states
/// explicitly. Implementations that talk to a model returning loose JSON
/// should run the payload through [`parse_summary_json`].
#[async_trait]
pub trait Summarizer: PluginAdapter {
    async fn summarize(
        &self,
        transcript: &str,
        level: SummaryLevel,
    ) -> Result<SummaryBody, HearthError>;
}

/// Validate an untyped summary payload into the five-field shape.
///
/// Missing fields become empty, a bare string in a list field becomes a
/// one-element list. Anything else (non-object payload, numbers where
/// text is expected, nested objects) is rejected as a validation error.
pub fn parse_summary_json(value: &Value) -> Result<SummaryBody, HearthError> {
    let obj = value.as_object().ok_or_else(|| {
        HearthError::Validation(format!("summary must be a JSON object, got {value}"))
    })?;

    Ok(SummaryBody {
        goal: text_field(obj.get("goal"), "goal")?,
        state: text_field(obj.get("state"), "state")?,
        open_loops: list_field(obj.get("open_loops"), "open_loops")?,
        constraints: list_field(obj.get("constraints"), "constraints")?,
        tone_notes: list_field(obj.get("tone_notes"), "tone_notes")?,
    })
}

fn text_field(value: Option<&Value>, name: &str) -> Result<String, HearthError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(HearthError::Validation(format!(
            "summary field `{name}` must be a string, got {other}"
        ))),
    }
}

fn list_field(value: Option<&Value>, name: &str) -> Result<Vec<String>, HearthError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok(if s.is_empty() {
                Vec::new()
            } else {
                vec![s.to_string()]
            })
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(HearthError::Validation(format!(
                    "summary field `{name}` must contain strings, got {other}"
                ))),
            })
            .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
            .collect(),
        Some(other) => Err(HearthError::Validation(format!(
            "summary field `{name}` must be a list, got {other}"
        ))),
    }
}
