// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock summarizer with a fixed reply.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hearth_core::{
    AdapterType, HealthStatus, HearthError, PluginAdapter, Summarizer, SummaryBody, SummaryLevel,
};
use tokio::sync::Mutex;

/// Returns the same body every call, or fails every call.
pub struct MockSummarizer {
    reply: Option<SummaryBody>,
    calls: AtomicUsize,
    transcripts: Mutex<Vec<(SummaryLevel, String)>>,
}

impl MockSummarizer {
    pub fn with_reply(reply: SummaryBody) -> Self {
        Self {
            reply: Some(reply),
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(level, transcript)` of every call, in order.
    pub async fn transcripts(&self) -> Vec<(SummaryLevel, String)> {
        self.transcripts.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockSummarizer {
    fn name(&self) -> &str {
        "mock-summarizer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Summarizer
    }

    async fn health_check(&self) -> Result<HealthStatus, HearthError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HearthError> {
        Ok(())
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        level: SummaryLevel,
    ) -> Result<SummaryBody, HearthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts
            .lock()
            .await
            .push((level, transcript.to_string()));
        self.reply
            .clone()
            .ok_or_else(|| HearthError::provider("mock summarizer failure"))
    }
}
