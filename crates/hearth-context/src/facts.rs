// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders ranked evidence as a bounded instruction block for prompts.

use crate::rerank::RankedEvidence;

const HEADER: &str = "[facts]\nTreat the items below as established facts. Do not contradict them \
and do not extend them beyond what they state.";

/// `- (source, W_fact=0.20) text` lines between a header and a footer
/// carrying `grounding_mode`. Empty when no item has text.
pub fn build_fact_constraint_block(
    evidence: &[RankedEvidence],
    grounding_mode: &str,
    w_fact: f64,
) -> String {
    let lines: Vec<String> = evidence
        .iter()
        .filter_map(|r| {
            let text = r.item.text.trim();
            if text.is_empty() {
                return None;
            }
            let source = match r.item.source.trim() {
                "" => "anchor",
                s => s,
            };
            Some(format!("- ({source}, W_fact={w_fact:.2}) {text}"))
        })
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    format!(
        "{HEADER}\n{}\n[/facts grounding_mode={grounding_mode}]",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rerank::rerank;
    use hearth_config::model::RerankConfig;
    use hearth_core::EvidenceItem;

    #[test]
    fn renders_lines_with_weight_and_source() {
        let ranked = rerank(
            vec![
                EvidenceItem {
                    score_vec: Some(1.0),
                    ..EvidenceItem::new("likes tea", "profile")
                },
                EvidenceItem::new("lives by the sea", ""),
            ],
            0,
            &RerankConfig::default(),
        );
        let block = build_fact_constraint_block(&ranked, "strict", 0.2);
        assert!(block.starts_with("[facts]\n"));
        assert!(block.contains("- (profile, W_fact=0.20) likes tea\n"));
        assert!(block.contains("- (anchor, W_fact=0.20) lives by the sea\n"));
        assert!(block.ends_with("[/facts grounding_mode=strict]"));
    }

    #[test]
    fn empty_without_text() {
        let ranked = rerank(
            vec![EvidenceItem::new("  ", "profile")],
            0,
            &RerankConfig::default(),
        );
        assert_eq!(build_fact_constraint_block(&ranked, "strict", 0.2), "");
        assert_eq!(build_fact_constraint_block(&[], "strict", 0.2), "");
    }
}
