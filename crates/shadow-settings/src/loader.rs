//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ShadowSettings::default()`]
//! 2. If `~/.shadow-rpc/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `SHADOW_RPC_*` environment overrides
//! 4. [`ShadowSettings::validate`]

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ShadowSettings;

/// Resolve the path to the settings file (`~/.shadow-rpc/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".shadow-rpc").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ShadowSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid final value is
/// an error.
pub fn load_settings_from_path(path: &Path) -> Result<ShadowSettings> {
    let mut settings = read_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn read_file_layer(path: &Path) -> Result<ShadowSettings> {
    let parse_err = |source: serde_json::Error| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let defaults = serde_json::to_value(ShadowSettings::default()).map_err(parse_err)?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(parse_err)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    serde_json::from_value(merged).map_err(parse_err)
}

/// Default location of the saved log history (`~/.shadow-rpc/session.log`).
pub fn history_path() -> PathBuf {
    settings_path().with_file_name("session.log")
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut ShadowSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup (env vars in production).
pub fn apply_overrides(settings: &mut ShadowSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("SHADOW_RPC_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("SHADOW_RPC_PORT") {
        match parse_u16_range(&v, 1, u16::MAX) {
            Some(port) => settings.server.port = port,
            None => warn!(key = "SHADOW_RPC_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = read("SHADOW_RPC_MAX_BODY_BYTES") {
        match parse_usize_range(&v, 1, 16 * 1024 * 1024) {
            Some(limit) => settings.server.max_body_bytes = limit,
            None => warn!(
                key = "SHADOW_RPC_MAX_BODY_BYTES",
                value = %v,
                "invalid body limit env var, ignoring"
            ),
        }
    }
    if let Some(v) = read("SHADOW_RPC_CLIENT_ID") {
        settings.discord.client_id = v;
    }
    if let Some(v) = read("SHADOW_RPC_IPC_PATH") {
        settings.discord.ipc_path = Some(PathBuf::from(v));
    }
    if let Some(v) = read("SHADOW_RPC_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("SHADOW_RPC_HISTORY_PATH") {
        settings.logging.history_path = Some(PathBuf::from(v));
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
