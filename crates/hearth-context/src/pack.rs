// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context packs: latest S4/S60 summaries plus a tail of recent messages.

use hearth_core::{HearthError, Message, Role, SummaryKind, SummaryRecord, TriggerType};
use hearth_storage::Database;
use hearth_storage::queries::{messages, sessions, summaries};
use serde::Serialize;

/// Longest rendered message line before clipping.
const LINE_CHARS: usize = 120;
const NONE_MARKER: &str = "(none)";
const TRUNCATED_MARKER: &str = "\n…(truncated)";

/// What a response or decision is conditioned on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPack {
    pub session_id: String,
    pub s4: Option<SummaryRecord>,
    pub s60: Option<SummaryRecord>,
    pub recent: Vec<Message>,
    pub latest_turn_id: i64,
    pub latest_user_turn: i64,
}

/// Latest S4 and S60 plus the last `recent_count` messages of any role.
///
/// An unknown session yields an empty pack.
pub async fn build_context_pack(
    db: &Database,
    session_id: &str,
    recent_count: usize,
) -> Result<ContextPack, HearthError> {
    build_context_pack_for_roles(db, session_id, recent_count, None).await
}

/// Same as [`build_context_pack`], keeping only `roles` in the tail.
pub async fn build_context_pack_for_roles(
    db: &Database,
    session_id: &str,
    recent_count: usize,
    roles: Option<&[Role]>,
) -> Result<ContextPack, HearthError> {
    let latest_turn_id = sessions::get_session(db, session_id)
        .await?
        .map_or(0, |s| s.last_turn_id);
    let s4 = summaries::latest_summary(db, SummaryKind::S4, session_id).await?;
    let s60 = summaries::latest_summary(db, SummaryKind::S60, session_id).await?;
    let recent = messages::recent_messages(db, session_id, recent_count, roles).await?;
    let latest_user_turn = messages::max_user_turn(db, session_id).await?;

    Ok(ContextPack {
        session_id: session_id.to_string(),
        s4,
        s60,
        recent,
        latest_turn_id,
        latest_user_turn,
    })
}

fn clip_chars(text: &str, max: usize) -> Option<&str> {
    text.char_indices().nth(max).map(|(idx, _)| &text[..idx])
}

fn render_line(message: &Message) -> Option<String> {
    let prefix = match message.role {
        Role::User => 'U',
        Role::Assistant => 'A',
        Role::System => return None,
    };
    let flat = message.content.replace('\n', " ");
    let flat = flat.trim();
    let body = match clip_chars(flat, LINE_CHARS) {
        Some(head) => format!("{head}…"),
        None => flat.to_string(),
    };
    Some(format!("{prefix}{}: {body}", message.user_turn))
}

fn render_summary(record: Option<&SummaryRecord>) -> String {
    record
        .and_then(|r| serde_json::to_string(&r.summary).ok())
        .unwrap_or_else(|| NONE_MARKER.to_string())
}

/// Labelled text block handed to the decider.
///
/// Only user/assistant lines appear under `[recent]`. The result is cut at
/// `max_chars` characters with a truncation marker.
pub fn render_decision_context(
    pack: &ContextPack,
    trigger_type: TriggerType,
    max_chars: usize,
) -> String {
    let mut out = vec![
        format!("[gateway] trigger={trigger_type} session={}", pack.session_id),
        "[S4 latest]".to_string(),
        render_summary(pack.s4.as_ref()),
        "[S60 latest]".to_string(),
        render_summary(pack.s60.as_ref()),
        "[recent]".to_string(),
    ];
    out.extend(pack.recent.iter().filter_map(render_line));
    let text = out.join("\n");

    match clip_chars(&text, max_chars) {
        Some(head) => format!("{head}{TRUNCATED_MARKER}"),
        None => text,
    }
}
