// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./immo.toml` > `~/.config/immo/immo.toml` > `/etc/immo/immo.toml`
//! with environment variable overrides via `IMMO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ImmoConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/immo/immo.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "immo.toml";

/// Sections that `IMMO_<SECTION>_<KEY>` variables are mapped into.
const ENV_SECTIONS: &[&str] = &["app", "backend", "counter", "notifications"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/immo/immo.toml` (system-wide)
/// 3. `~/.config/immo/immo.toml` (user XDG config)
/// 4. `./immo.toml` (local directory)
/// 5. `IMMO_*` environment variables
pub fn load_config() -> Result<ImmoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ImmoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImmoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ImmoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImmoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ImmoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/immo/immo.toml` on Linux, the platform equivalent elsewhere.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("immo").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider using explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `IMMO_BACKEND_ANON_KEY` must map to `backend.anon_key`, not
/// `backend.anon.key`.
fn env_provider() -> Env {
    Env::prefixed("IMMO_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped variable name to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_underscore_after_section() {
        assert_eq!(map_env_key("backend_anon_key"), "backend.anon_key");
        assert_eq!(
            map_env_key("counter_poll_interval_secs"),
            "counter.poll_interval_secs"
        );
        assert_eq!(
            map_env_key("notifications_auto_dismiss_secs"),
            "notifications.auto_dismiss_secs"
        );
        assert_eq!(map_env_key("app_log_level"), "app.log_level");
    }

    #[test]
    fn unknown_sections_are_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[counter]\npoll_interval_secs = 9\n")?;
            jail.set_env("IMMO_COUNTER_POLL_INTERVAL_SECS", "3");
            jail.set_env("IMMO_BACKEND_ANON_KEY", "anon-from-env");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.counter.poll_interval_secs, 3);
            assert_eq!(config.backend.anon_key.as_deref(), Some("anon-from-env"));
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up_by_default_hierarchy() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[notifications]\ncapacity = 12\n")?;
            let config = load_config()?;
            assert_eq!(config.notifications.capacity, 12);
            Ok(())
        });
    }
}
