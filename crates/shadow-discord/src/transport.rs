//! Locating and opening the Discord IPC endpoint.
//!
//! Discord listens on `discord-ipc-0` through `discord-ipc-9`. On Unix these
//! are sockets in the runtime or temp directory (also inside the Flatpak and
//! Snap sandboxes); on Windows they are named pipes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::client::IpcStream;
use crate::errors::IpcError;

const SLOTS: u8 = 10;

/// Candidate endpoint paths in the order they are tried, using `lookup` for env vars.
#[cfg(unix)]
pub fn candidate_paths(lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let from_env = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"]
        .into_iter()
        .filter_map(|name| lookup(name).filter(|v| !v.is_empty()))
        .map(PathBuf::from);
    for dir in from_env.chain(std::iter::once(PathBuf::from("/tmp"))) {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    let mut paths = Vec::new();
    for dir in &dirs {
        for sub in ["", "app/com.discordapp.Discord", "snap.discord"] {
            let base = if sub.is_empty() { dir.clone() } else { dir.join(sub) };
            for slot in 0..SLOTS {
                paths.push(base.join(format!("discord-ipc-{slot}")));
            }
        }
    }
    paths
}

/// Candidate endpoint paths in the order they are tried.
#[cfg(windows)]
pub fn candidate_paths(_lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    (0..SLOTS)
        .map(|slot| PathBuf::from(format!(r"\\?\pipe\discord-ipc-{slot}")))
        .collect()
}

/// Opens a fresh IPC stream for every (re)connect attempt.
#[async_trait]
pub trait Connect: Send + Sync {
    /// Open a stream to the Discord client.
    async fn open(&self) -> Result<Box<dyn IpcStream>, IpcError>;
}

/// The local Discord client, at a fixed path or discovered on each attempt.
#[derive(Clone, Debug, Default)]
pub struct Endpoint {
    path: Option<PathBuf>,
}

impl Endpoint {
    /// `None` tries every [`candidate_paths`] entry on each attempt.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Connect for Endpoint {
    async fn open(&self) -> Result<Box<dyn IpcStream>, IpcError> {
        open(self.path.as_deref()).await
    }
}

/// Open `explicit` if given, otherwise the first candidate that accepts.
pub async fn open(explicit: Option<&Path>) -> Result<Box<dyn IpcStream>, IpcError> {
    if let Some(path) = explicit {
        return Ok(connect_path(path).await?);
    }
    for path in candidate_paths(|name| std::env::var(name).ok()) {
        match connect_path(&path).await {
            Ok(stream) => {
                debug!(path = %path.display(), "discord ipc endpoint found");
                return Ok(stream);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "ipc endpoint unavailable"),
        }
    }
    Err(IpcError::NotFound)
}

#[cfg(unix)]
async fn connect_path(path: &Path) -> std::io::Result<Box<dyn IpcStream>> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    Ok(Box::new(stream))
}

#[cfg(windows)]
async fn connect_path(path: &Path) -> std::io::Result<Box<dyn IpcStream>> {
    let pipe = tokio::net::windows::named_pipe::ClientOptions::new().open(path)?;
    Ok(Box::new(pipe))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn runtime_dir_is_tried_first() {
        let paths = candidate_paths(|name| {
            (name == "XDG_RUNTIME_DIR").then(|| "/run/user/1000".to_string())
        });
        assert_eq!(paths[0], PathBuf::from("/run/user/1000/discord-ipc-0"));
        assert_eq!(paths[9], PathBuf::from("/run/user/1000/discord-ipc-9"));
        assert_eq!(
            paths[10],
            PathBuf::from("/run/user/1000/app/com.discordapp.Discord/discord-ipc-0")
        );
        assert!(paths.contains(&PathBuf::from("/tmp/discord-ipc-0")));
    }

    #[test]
    fn tmp_fallback_when_env_is_empty() {
        let paths = candidate_paths(|_| None);
        assert_eq!(paths.len(), 30);
        assert_eq!(paths[0], PathBuf::from("/tmp/discord-ipc-0"));
    }

    #[tokio::test]
    async fn explicit_missing_path_is_io_error() {
        let dir = tempfile_dir();
        let err = open(Some(&dir.join("discord-ipc-0"))).await.err().unwrap();
        assert!(matches!(err, IpcError::Io(_)));
    }

    #[tokio::test]
    async fn endpoint_reaches_listening_socket() {
        let dir = tempfile_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("discord-ipc-0");
        let server = tokio::net::UnixListener::bind(&path).unwrap();

        let endpoint = Endpoint::new(Some(path));
        let (opened, accepted) = tokio::join!(endpoint.open(), server.accept());
        assert!(opened.is_ok());
        assert!(accepted.is_ok());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn tempfile_dir() -> PathBuf {
        std::env::temp_dir().join(format!("shadow-rpc-missing-{}", uuid::Uuid::new_v4()))
    }
}
