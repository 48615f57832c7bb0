// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Hearth integration tests.
//!
//! Provides mock collaborators and a harness wiring the full stack over a
//! temporary SQLite database, so pipeline tests run without any external
//! service.
//!
//! # Components
//!
//! - [`MockSummarizer`] - scripted summaries or a forced failure
//! - [`MockDecider`] - scripted decisions with call capture
//! - [`MockChannel`] - captures deliveries, can be switched to fail
//! - [`TestHarness`] - ledger, scanner and processor over a temp database

pub mod harness;
pub mod mock_channel;
pub mod mock_decider;
pub mod mock_summarizer;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{Delivery, MockChannel};
pub use mock_decider::{DecideCall, MockDecider};
pub use mock_summarizer::MockSummarizer;
