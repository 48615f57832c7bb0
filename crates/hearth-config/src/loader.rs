// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hearth.toml` > `~/.config/hearth/hearth.toml` > `/etc/hearth/hearth.toml`
//! with environment variable overrides via `HEARTH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HearthConfig;

/// Top-level sections reachable through `HEARTH_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "storage",
    "ledger",
    "summary",
    "rerank",
    "proactive",
    "context",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hearth/hearth.toml` (system-wide)
/// 3. `~/.config/hearth/hearth.toml` (user XDG config)
/// 4. `./hearth.toml` (local directory)
/// 5. `HEARTH_*` environment variables
pub fn load_config() -> Result<HearthConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string layered over the defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file("/etc/hearth/hearth.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hearth/hearth.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("hearth.toml"))
        .merge(env_provider())
}

/// Environment provider mapping the first `_` after a known section to a dot.
///
/// `HEARTH_PROACTIVE_MAX_CONTEXT_CHARS` must become
/// `proactive.max_context_chars`, so `Env::split("_")` cannot be used.
fn env_provider() -> Env {
    Env::prefixed("HEARTH_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a figment key path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section() {
        assert_eq!(
            map_env_key("proactive_max_context_chars"),
            "proactive.max_context_chars"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("summary_s4_every"), "summary.s4_every");
        assert_eq!(map_env_key("context_recent_messages"), "context.recent_messages");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(map_env_key("telemetry_url"), "telemetry_url");
    }

    #[test]
    fn env_override_reaches_nested_key() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HEARTH_PROACTIVE_BATCH_LIMIT", "9");
            jail.set_env("HEARTH_AGENT_NAME", "ember");
            let config: HearthConfig = Figment::new()
                .merge(Serialized::defaults(HearthConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.proactive.batch_limit, 9);
            assert_eq!(config.agent.name, "ember");
            Ok(())
        });
    }
}
