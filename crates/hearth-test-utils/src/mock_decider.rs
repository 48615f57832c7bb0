// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock decider returning scripted outputs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use hearth_core::{
    AdapterType, Decider, DecisionOutput, HealthStatus, HearthError, PluginAdapter, TriggerType,
};
use tokio::sync::Mutex;

/// Arguments of one `decide` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideCall {
    pub trigger_type: TriggerType,
    pub session_id: String,
    pub context: String,
}

enum Mode {
    Scripted,
    Failing(String),
    Hanging,
}

/// Pops scripted outputs in order; skips once they run out.
pub struct MockDecider {
    outputs: Mutex<VecDeque<DecisionOutput>>,
    calls: Mutex<Vec<DecideCall>>,
    mode: Mode,
}

impl MockDecider {
    pub fn new() -> Self {
        Self::with_outputs(Vec::new())
    }

    pub fn with_outputs(outputs: Vec<DecisionOutput>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            calls: Mutex::new(Vec::new()),
            mode: Mode::Scripted,
        }
    }

    /// Every call returns a provider error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: Mode::Failing(message.into()),
            ..Self::new()
        }
    }

    /// Every call sleeps for an hour.
    pub fn hanging() -> Self {
        Self {
            mode: Mode::Hanging,
            ..Self::new()
        }
    }

    pub async fn calls(&self) -> Vec<DecideCall> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockDecider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockDecider {
    fn name(&self) -> &str {
        "mock-decider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Decider
    }

    async fn health_check(&self) -> Result<HealthStatus, HearthError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HearthError> {
        Ok(())
    }
}

#[async_trait]
impl Decider for MockDecider {
    async fn decide(
        &self,
        trigger_type: TriggerType,
        session_id: &str,
        context: &str,
    ) -> Result<DecisionOutput, HearthError> {
        self.calls.lock().await.push(DecideCall {
            trigger_type,
            session_id: session_id.to_string(),
            context: context.to_string(),
        });
        match &self.mode {
            Mode::Scripted => Ok(self
                .outputs
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| DecisionOutput::skip("no scripted decision"))),
            Mode::Failing(message) => Err(HearthError::provider(message.clone())),
            Mode::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(DecisionOutput::skip("woke up"))
            }
        }
    }
}
