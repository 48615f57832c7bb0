// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision function consulted before any proactive message is sent.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DecisionOutput, TriggerType};

/// Decides whether a trigger warrants a message, and drafts it.
///
/// Errors are mapped to a skip decision by the caller, so implementations
/// may fail freely.
#[async_trait]
pub trait Decider: PluginAdapter {
    async fn decide(
        &self,
        trigger_type: TriggerType,
        session_id: &str,
        context: &str,
    ) -> Result<DecisionOutput, HearthError>;
}
