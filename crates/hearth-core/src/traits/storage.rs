// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the persistence backend holding the six ledger tables.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), HearthError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), HearthError>;
}
