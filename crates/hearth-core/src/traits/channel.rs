// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery channel trait for proactive messages (Telegram, web push, ...).

use async_trait::async_trait;

use crate::error::HearthError;
use crate::traits::adapter::PluginAdapter;

/// Outbound-only delivery seam used by the job processor.
///
/// Implementations own the vendor wire protocol. A returned error marks the
/// outbox row and its job as failed; nothing is retried.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Delivers `text` to `recipient` over the named `channel`.
    async fn deliver(&self, channel: &str, recipient: &str, text: &str)
    -> Result<(), HearthError>;
}
