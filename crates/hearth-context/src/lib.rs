// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context management for the Hearth companion agent.
//!
//! Windowed S4/S60 summaries with their post-filter, evidence reranking,
//! and the context packs handed to responders and the proactive decider.

pub mod facts;
pub mod pack;
pub mod rerank;
pub mod sanitizer;
pub mod summary;

pub use facts::build_fact_constraint_block;
pub use pack::{ContextPack, build_context_pack, build_context_pack_for_roles, render_decision_context};
pub use rerank::{RankedEvidence, assemble_evidence_text, rerank, score_final, score_mix};
pub use sanitizer::Sanitizer;
pub use summary::{SkipReason, SummaryEngine, WindowOutcome, placeholder_summary};
