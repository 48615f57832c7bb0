// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Component wiring shared by every subcommand.

use std::sync::Arc;

use hearth_agent::{
    JobProcessor, TriggerScanner, TurnLedger, UnconfiguredChannel, UnconfiguredDecider,
};
use hearth_config::model::HearthConfig;
use hearth_context::SummaryEngine;
use hearth_core::{HearthError, StorageAdapter};
use hearth_storage::{Database, SqliteStorage};
use tracing::info;

/// Opened storage plus the components built on it.
pub struct App {
    pub config: HearthConfig,
    pub storage: SqliteStorage,
    pub db: Database,
    pub ledger: TurnLedger,
    pub scanner: Arc<TriggerScanner>,
    pub processor: Arc<JobProcessor>,
}

impl App {
    /// Open the database and wire the ledger, scanner and processor.
    ///
    /// No vendor collaborators ship with this binary: summaries fall back
    /// to placeholders, decisions to skip, and deliveries fail.
    pub async fn open(config: HearthConfig) -> Result<Self, HearthError> {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let db = storage.database()?.clone();

        let summaries = Arc::new(SummaryEngine::new(db.clone(), None, config.summary.clone()));
        let ledger = TurnLedger::new(db.clone(), config.ledger.clone(), summaries);
        let scanner = Arc::new(TriggerScanner::new(db.clone(), config.proactive.clone()));
        let processor = Arc::new(JobProcessor::new(
            db.clone(),
            Arc::new(UnconfiguredDecider),
            Arc::new(UnconfiguredChannel),
            config.proactive.clone(),
        ));

        info!(path = %config.storage.database_path, "storage opened");
        Ok(Self {
            config,
            storage,
            db,
            ledger,
            scanner,
            processor,
        })
    }

    /// Checkpoint and close the database.
    pub async fn close(self) -> Result<(), HearthError> {
        self.storage.close().await?;
        self.db.close().await
    }
}
