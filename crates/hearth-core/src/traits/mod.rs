// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Everything outside the ledger and scheduling core (persistence backend,
//! compression model, decision model, delivery channel) plugs in through
//! one of these traits. All extend [`PluginAdapter`] and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod decider;
pub mod storage;
pub mod summarizer;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use decider::Decider;
pub use storage::StorageAdapter;
pub use summarizer::{Summarizer, parse_summary_json};
