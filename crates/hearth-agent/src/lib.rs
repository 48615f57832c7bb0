// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateful core of the Hearth companion agent.
//!
//! - [`TurnLedger`] appends turns with optimistic concurrency and fires the
//!   S4/S60 summary windows after each exchange.
//! - [`TriggerScanner`] turns long user silences into queued trigger jobs,
//!   respecting a per-session cooldown.
//! - [`JobProcessor`] claims queued jobs, asks the decider, records an
//!   outbox row and delivers through the channel.
//!
//! The [`scheduler`] module runs the two sweeps on fixed periods.

pub mod fallback;
pub mod ledger;
pub mod processor;
pub mod scanner;
pub mod scheduler;
pub mod shutdown;

pub use fallback::{UnconfiguredChannel, UnconfiguredDecider};
pub use ledger::{DEFAULT_PLATFORM, ExchangeAppended, TurnLedger};
pub use processor::{JobOutcome, JobProcessor, validate_decision};
pub use scanner::TriggerScanner;
pub use scheduler::{spawn_processor_loop, spawn_scanner_loop};
pub use shutdown::install_signal_handler;
