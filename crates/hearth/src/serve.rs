// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth serve`: run both periodic sweeps until a shutdown signal.

use std::time::Duration;

use hearth_agent::{install_signal_handler, spawn_processor_loop, spawn_scanner_loop};
use hearth_core::HearthError;
use tracing::{info, warn};

use crate::app::App;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hearth={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

pub async fn run_serve(app: App) -> Result<(), HearthError> {
    let proactive = &app.config.proactive;
    info!(
        agent = %app.config.agent.name,
        scan_interval_secs = proactive.scan_interval_secs,
        process_interval_secs = proactive.process_interval_secs,
        "hearth serving"
    );

    let cancel = install_signal_handler();
    let scan = spawn_scanner_loop(
        app.scanner.clone(),
        Duration::from_secs(proactive.scan_interval_secs),
        cancel.clone(),
    );
    let process = spawn_processor_loop(
        app.processor.clone(),
        Duration::from_secs(proactive.process_interval_secs),
        proactive.batch_limit,
        cancel.clone(),
    );

    cancel.cancelled().await;
    for (name, handle) in [("scanner", scan), ("processor", process)] {
        if let Err(e) = handle.await {
            warn!(task = name, error = %e, "background task ended abnormally");
        }
    }

    app.close().await?;
    info!("hearth stopped");
    Ok(())
}
