// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evidence reranking and fusion.
//!
//! Pure functions, no I/O. Vector and keyword relevance are mixed 70/30,
//! then boosted by the fact weight scaled with time decay and hit boost.

use hearth_config::model::RerankConfig;
use hearth_core::EvidenceItem;
use serde::Serialize;

/// Weight of the vector-similarity score in the mix.
pub const VEC_WEIGHT: f64 = 0.7;
/// Weight of the keyword score in the mix.
pub const KEY_WEIGHT: f64 = 0.3;

/// An evidence item with its computed scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEvidence {
    pub item: EvidenceItem,
    pub score_mix: f64,
    pub score_final: f64,
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// `0.7 * score_vec + 0.3 * score_key`, missing scores count as 0.0.
pub fn score_mix(item: &EvidenceItem) -> f64 {
    VEC_WEIGHT * finite_or(item.score_vec, 0.0) + KEY_WEIGHT * finite_or(item.score_key, 0.0)
}

/// `score_mix * (1 + w_fact * time_decay * hit_boost)`.
pub fn score_final(item: &EvidenceItem, config: &RerankConfig) -> f64 {
    let decay = finite_or(item.time_decay, config.default_time_decay);
    let boost = finite_or(item.hit_boost, config.default_hit_boost);
    score_mix(item) * (1.0 + config.w_fact * decay * boost)
}

/// Score, sort descending and truncate to `top_k` (`<= 0` keeps all).
///
/// Equal scores keep their input order.
pub fn rerank(items: Vec<EvidenceItem>, top_k: i64, config: &RerankConfig) -> Vec<RankedEvidence> {
    let mut ranked: Vec<RankedEvidence> = items
        .into_iter()
        .map(|item| RankedEvidence {
            score_mix: score_mix(&item),
            score_final: score_final(&item, config),
            item,
        })
        .collect();

    // slice::sort_by is stable
    ranked.sort_by(|a, b| b.score_final.total_cmp(&a.score_final));

    if top_k > 0 {
        ranked.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));
    }
    ranked
}

/// Non-empty trimmed texts joined by a blank line.
pub fn assemble_evidence_text(ranked: &[RankedEvidence]) -> String {
    ranked
        .iter()
        .map(|r| r.item.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
