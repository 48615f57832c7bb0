// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-period background loops for the scanner and the processor.
//!
//! Each loop skips the immediate first tick, then runs one sweep per
//! period until the token is cancelled. A failed sweep is logged and the
//! loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::processor::JobProcessor;
use crate::scanner::TriggerScanner;

/// Spawn the silence scanner loop.
pub fn spawn_scanner_loop(
    scanner: Arc<TriggerScanner>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        info!(period_secs = period.as_secs(), "silence scanner started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match scanner.scan().await {
                        Ok(created) => debug!(created, "silence scan tick"),
                        Err(e) => warn!(error = %e, "silence scan failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("silence scanner shutting down");
                    break;
                }
            }
        }
    })
}

/// Spawn the job processor loop, claiming up to `batch_limit` per tick.
pub fn spawn_processor_loop(
    processor: Arc<JobProcessor>,
    period: Duration,
    batch_limit: usize,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        info!(period_secs = period.as_secs(), batch_limit, "job processor started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match processor.process(batch_limit).await {
                        Ok(processed) => debug!(processed, "job processor tick"),
                        Err(e) => warn!(error = %e, "job processing failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("job processor shutting down");
                    break;
                }
            }
        }
    })
}
