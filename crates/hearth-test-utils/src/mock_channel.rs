// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery channel capturing every send.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hearth_core::{AdapterType, ChannelAdapter, HealthStatus, HearthError, PluginAdapter};
use tokio::sync::Mutex;

/// One captured delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: String,
    pub recipient: String,
    pub text: String,
}

/// Records deliveries; fails them all while `set_failing(true)`.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<Delivery>>>,
    failing: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every successful delivery so far.
    pub async fn sent_messages(&self) -> Vec<Delivery> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HearthError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HearthError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn deliver(&self, channel: &str, recipient: &str, text: &str) -> Result<(), HearthError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HearthError::channel("mock delivery failure"));
        }
        self.sent.lock().await.push(Delivery {
            channel: channel.to_string(),
            recipient: recipient.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_and_fails_on_demand() {
        let channel = MockChannel::new();
        channel.deliver("telegram", "1", "hi").await.unwrap();
        channel.set_failing(true);
        assert!(channel.deliver("telegram", "1", "again").await.is_err());
        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(channel.sent_messages().await[0].text, "hi");
    }
}
