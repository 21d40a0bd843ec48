//! Settings structs with compiled defaults.

use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Discord IPC client.
    pub discord: DiscordSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl ShadowSettings {
    /// Reject values the bridge cannot run with.
    ///
    /// The listener trusts its callers, so it may only bind a loopback host.
    pub fn validate(&self) -> Result<()> {
        if !is_loopback_host(&self.server.host) {
            return Err(SettingsError::NonLoopbackHost(self.server.host.clone()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "server.max_body_bytes must be greater than zero".into(),
            ));
        }
        if self.discord.client_id.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "discord.client_id must not be empty".into(),
            ));
        }
        if self.logging.history_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "logging.history_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Loopback host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Discord IPC settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Application id the presence is published under.
    pub client_id: String,
    /// Explicit IPC socket or pipe path; discovered when unset.
    pub ipc_path: Option<PathBuf>,
    /// Connect plus handshake deadline.
    pub connect_timeout_ms: u64,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            client_id: "1416838465768652961".into(),
            ipc_path: None,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub level: String,
    /// Lines kept by the in-memory log history.
    pub history_capacity: usize,
    /// Where the history is saved on shutdown; next to the settings file
    /// when unset.
    pub history_path: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            history_capacity: 500,
            history_path: None,
        }
    }
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts_accepted() {
        for host in ["127.0.0.1", "127.0.0.2", "::1", "localhost", "LOCALHOST"] {
            assert!(is_loopback_host(host), "{host}");
        }
    }

    #[test]
    fn non_loopback_hosts_rejected() {
        for host in ["0.0.0.0", "192.168.1.10", "example.com", ""] {
            assert!(!is_loopback_host(host), "{host}");
        }
    }

    #[test]
    fn validate_rejects_public_bind() {
        let mut settings = ShadowSettings::default();
        settings.server.host = "0.0.0.0".into();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::NonLoopbackHost(host) if host == "0.0.0.0"));
    }

    #[test]
    fn validate_rejects_empty_client_id() {
        let mut settings = ShadowSettings::default();
        settings.discord.client_id = "  ".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_body_limit() {
        let mut settings = ShadowSettings::default();
        settings.server.max_body_bytes = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: ShadowSettings =
            serde_json::from_str(r#"{"server":{"port":9000}}"#).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.discord, DiscordSettings::default());
    }
}
