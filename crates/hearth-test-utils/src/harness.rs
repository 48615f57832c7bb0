// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` assembles ledger, summary engine, scanner and processor
//! over a temporary SQLite database with mock collaborators.

use std::sync::Arc;

use hearth_agent::{JobProcessor, TriggerScanner, TurnLedger};
use hearth_config::model::{HearthConfig, StorageConfig};
use hearth_context::SummaryEngine;
use hearth_core::{DecisionOutput, HearthError, StorageAdapter, Summarizer, SummaryBody};
use hearth_storage::{Database, SqliteStorage};

use crate::mock_channel::MockChannel;
use crate::mock_decider::MockDecider;
use crate::mock_summarizer::MockSummarizer;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: HearthConfig,
    decisions: Vec<DecisionOutput>,
    summary_reply: Option<SummaryBody>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: HearthConfig::default(),
            decisions: Vec::new(),
            summary_reply: None,
        }
    }

    /// Start from this configuration (the storage section is replaced).
    pub fn with_config(mut self, config: HearthConfig) -> Self {
        self.config = config;
        self
    }

    /// Decisions the mock decider returns, in order.
    pub fn with_decisions(mut self, decisions: Vec<DecisionOutput>) -> Self {
        self.decisions = decisions;
        self
    }

    /// Wire a mock summarizer returning `reply`. Without it the engine
    /// stores placeholder summaries.
    pub fn with_summary_reply(mut self, reply: SummaryBody) -> Self {
        self.summary_reply = Some(reply);
        self
    }

    pub async fn build(self) -> Result<TestHarness, HearthError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| HearthError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let db = storage.database()?.clone();

        let mock_summarizer = self.summary_reply.map(|r| Arc::new(MockSummarizer::with_reply(r)));
        let summarizer = mock_summarizer
            .clone()
            .map(|s| s as Arc<dyn Summarizer>);
        let summaries = Arc::new(SummaryEngine::new(
            db.clone(),
            summarizer,
            config.summary.clone(),
        ));
        let ledger = TurnLedger::new(db.clone(), config.ledger.clone(), summaries.clone());
        let scanner = TriggerScanner::new(db.clone(), config.proactive.clone());

        let mock_decider = Arc::new(MockDecider::with_outputs(self.decisions));
        let mock_channel = Arc::new(MockChannel::new());
        let processor = JobProcessor::new(
            db.clone(),
            mock_decider.clone(),
            mock_channel.clone(),
            config.proactive.clone(),
        );

        Ok(TestHarness {
            config,
            storage,
            db,
            summaries,
            ledger,
            scanner,
            processor,
            mock_summarizer,
            mock_decider,
            mock_channel,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete pipeline over a temp database.
pub struct TestHarness {
    pub config: HearthConfig,
    pub storage: SqliteStorage,
    pub db: Database,
    pub summaries: Arc<SummaryEngine>,
    pub ledger: TurnLedger,
    pub scanner: TriggerScanner,
    pub processor: JobProcessor,
    pub mock_summarizer: Option<Arc<MockSummarizer>>,
    pub mock_decider: Arc<MockDecider>,
    pub mock_channel: Arc<MockChannel>,
    /// Kept alive so the database file outlives the harness.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(self) -> Result<(), HearthError> {
        self.storage.close().await?;
        self.db.close().await
    }
}
