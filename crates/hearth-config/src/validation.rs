// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express,
//! such as non-empty paths and positive cadences.

use crate::diagnostic::ConfigError;
use crate::model::HearthConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HearthConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty".to_string()));
    }

    let summary = &config.summary;
    for (key, value) in [
        ("summary.s4_every", summary.s4_every),
        ("summary.s4_window", summary.s4_window),
        ("summary.s60_every", summary.s60_every),
        ("summary.s60_window", summary.s60_window),
    ] {
        if value < 1 {
            errors.push(invalid(format!("{key} must be at least 1, got {value}")));
        }
    }
    if summary.timeout_secs == 0 {
        errors.push(invalid("summary.timeout_secs must be at least 1".to_string()));
    }
    for rule in &summary.sanitizer.open_loop_rewrites {
        if rule.pattern.is_empty() {
            errors.push(invalid(
                "summary.sanitizer.open_loop_rewrites entries need a non-empty pattern"
                    .to_string(),
            ));
        }
    }

    let rerank = &config.rerank;
    if rerank.w_fact.is_nan() || rerank.w_fact < 0.0 {
        errors.push(invalid(format!(
            "rerank.w_fact must be non-negative, got {}",
            rerank.w_fact
        )));
    }

    let proactive = &config.proactive;
    for (key, value) in [
        ("proactive.scan_interval_secs", proactive.scan_interval_secs),
        ("proactive.process_interval_secs", proactive.process_interval_secs),
        ("proactive.decide_timeout_secs", proactive.decide_timeout_secs),
        ("proactive.deliver_timeout_secs", proactive.deliver_timeout_secs),
    ] {
        if value == 0 {
            errors.push(invalid(format!("{key} must be at least 1")));
        }
    }
    if proactive.batch_limit == 0 {
        errors.push(invalid("proactive.batch_limit must be at least 1".to_string()));
    }
    if proactive.max_text_chars == 0 {
        errors.push(invalid("proactive.max_text_chars must be at least 1".to_string()));
    }
    if proactive.lease_secs < 1 {
        errors.push(invalid(format!(
            "proactive.lease_secs must be at least 1, got {}",
            proactive.lease_secs
        )));
    }
    for (key, value) in [
        (
            "proactive.default_silence_threshold_min",
            proactive.default_silence_threshold_min,
        ),
        (
            "proactive.default_silence_cooldown_min",
            proactive.default_silence_cooldown_min,
        ),
    ] {
        if value < 0 {
            errors.push(invalid(format!("{key} must be non-negative, got {value}")));
        }
    }
    if proactive.channel.trim().is_empty() {
        errors.push(invalid("proactive.channel must not be empty".to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
