// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow post-filter for one known summarizer failure: inventing requests
//! for (or offers of) financial help the transcript never contains.
//!
//! This is a lexical rule set, not a content filter. Phrases are only
//! removed when the transcript has none of the configured help cues.

use hearth_config::model::SanitizerConfig;
use hearth_core::SummaryBody;

/// Characters trimmed from the ends of a field after a phrase is cut out.
const TRIM_CHARS: &[char] = &['，', '。', ';', '；', ' '];

/// Applies the configured rule set to summarizer output.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: SanitizerConfig,
}

impl Sanitizer {
    pub fn new(rules: SanitizerConfig) -> Self {
        Self { rules }
    }

    /// Whether the transcript contains an explicit help-seeking cue.
    pub fn has_help_cue(&self, transcript: &str) -> bool {
        self.rules
            .help_cues
            .iter()
            .any(|cue| !cue.is_empty() && transcript.contains(cue.as_str()))
    }

    /// Clean `body` against `transcript`.
    ///
    /// Empty `goal`/`state` are always backfilled with the configured
    /// fallback text so readers never see a blank field.
    pub fn sanitize(&self, transcript: &str, mut body: SummaryBody) -> SummaryBody {
        if !self.has_help_cue(transcript) {
            body.goal = strip_phrases(&body.goal, &self.rules.goal_phrases);
            body.state = strip_phrases(&body.state, &self.rules.state_phrases);
            body.open_loops = body
                .open_loops
                .into_iter()
                .map(|item| {
                    let rewritten = self
                        .rules
                        .open_loop_rewrites
                        .iter()
                        .filter(|rule| !rule.pattern.is_empty())
                        .fold(item, |acc, rule| {
                            acc.replace(rule.pattern.as_str(), &rule.replacement)
                        });
                    rewritten.trim_matches(TRIM_CHARS).to_string()
                })
                .collect();
        }

        if body.goal.trim().is_empty() {
            body.goal = self.rules.goal_fallback.clone();
        }
        if body.state.trim().is_empty() {
            body.state = self.rules.state_fallback.clone();
        }
        body
    }
}

fn strip_phrases(field: &str, phrases: &[String]) -> String {
    let mut out = field.to_string();
    for phrase in phrases.iter().filter(|p| !p.is_empty()) {
        if out.contains(phrase.as_str()) {
            out = out.replace(phrase.as_str(), "").trim_matches(TRIM_CHARS).to_string();
        }
    }
    out
}
