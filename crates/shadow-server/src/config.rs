//! Listener configuration.

use shadow_settings::ServerSettings;

/// Where the listener binds and how much body it reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Loopback host (default `"127.0.0.1"`).
    pub host: String,
    /// Port (default `8000`; `0` picks a free port).
    pub port: u16,
    /// Largest body read before the request fails.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ListenerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_body_bytes: settings.max_body_bytes,
        }
    }
}

impl ListenerConfig {
    /// Bind to an OS-assigned loopback port.
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            ..Self::default()
        }
    }
}
