// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators wired in when no decider or channel backend is configured.

use async_trait::async_trait;
use hearth_core::{
    AdapterType, ChannelAdapter, Decider, DecisionOutput, HealthStatus, HearthError,
    PluginAdapter, TriggerType,
};

/// Always decides to skip.
#[derive(Debug, Default)]
pub struct UnconfiguredDecider;

#[async_trait]
impl PluginAdapter for UnconfiguredDecider {
    fn name(&self) -> &str {
        "unconfigured-decider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Decider
    }

    async fn health_check(&self) -> Result<HealthStatus, HearthError> {
        Ok(HealthStatus::Degraded("no decider configured".to_string()))
    }

    async fn shutdown(&self) -> Result<(), HearthError> {
        Ok(())
    }
}

#[async_trait]
impl Decider for UnconfiguredDecider {
    async fn decide(
        &self,
        _trigger_type: TriggerType,
        _session_id: &str,
        _context: &str,
    ) -> Result<DecisionOutput, HearthError> {
        Ok(DecisionOutput::skip("decider not configured"))
    }
}

/// Refuses every delivery.
#[derive(Debug, Default)]
pub struct UnconfiguredChannel;

#[async_trait]
impl PluginAdapter for UnconfiguredChannel {
    fn name(&self) -> &str {
        "unconfigured-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HearthError> {
        Ok(HealthStatus::Degraded("no channel configured".to_string()))
    }

    async fn shutdown(&self) -> Result<(), HearthError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for UnconfiguredChannel {
    async fn deliver(&self, channel: &str, _recipient: &str, _text: &str) -> Result<(), HearthError> {
        Err(HearthError::channel(format!(
            "no delivery backend configured for channel `{channel}`"
        )))
    }
}
