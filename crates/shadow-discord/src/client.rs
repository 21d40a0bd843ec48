//! Discord IPC session used as a [`PresenceSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use shadow_core::{PresenceSink, PresenceUpdate, TransmissionError};
use shadow_settings::DiscordSettings;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity;
use crate::errors::IpcError;
use crate::frame::{Opcode, read_frame, write_frame};
use crate::transport::{Connect, Endpoint};

const HANDSHAKE_VERSION: u32 = 1;

/// Any duplex byte stream the IPC protocol can run over.
pub trait IpcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> IpcStream for T {}

type Session = Box<dyn IpcStream>;

/// Presence sink speaking the Discord IPC protocol.
///
/// Construction never touches the socket, so the bridge can start before
/// Discord does. A publish without a live session opens one first (one
/// attempt, bounded by the connect timeout); a publish whose exchange fails
/// drops the session so the next one reconnects.
///
/// The session mutex is held for one connect or request/response exchange,
/// so publishes are serialized internally.
pub struct DiscordIpcSink {
    client_id: String,
    pid: u32,
    connect_timeout: Duration,
    connector: Box<dyn Connect>,
    session: Mutex<Option<Session>>,
    closed: AtomicBool,
}

impl DiscordIpcSink {
    /// Sink for the local Discord client described by `settings`.
    pub fn new(settings: &DiscordSettings) -> Self {
        Self::with_connector(
            settings.client_id.clone(),
            Duration::from_millis(settings.connect_timeout_ms),
            Endpoint::new(settings.ipc_path.clone()),
        )
    }

    /// Sink that opens its streams through `connector`.
    pub fn with_connector(
        client_id: impl Into<String>,
        connect_timeout: Duration,
        connector: impl Connect + 'static,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            pid: std::process::id(),
            connect_timeout,
            connector: Box::new(connector),
            session: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Open and handshake a session unless one is live. Reopens a sink that
    /// was disconnected.
    pub async fn connect(&self) -> Result<(), IpcError> {
        self.closed.store(false, Ordering::SeqCst);
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            *guard = Some(self.establish().await?);
        }
        Ok(())
    }

    /// Application id this sink publishes under.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether a session is currently open.
    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Clear the presence and close the channel. Later publishes fail with
    /// [`TransmissionError::Unavailable`] until [`connect`](Self::connect)
    /// is called again. Idempotent.
    pub async fn disconnect(&self) -> Result<(), IpcError> {
        self.closed.store(true, Ordering::SeqCst);
        let Some(mut session) = self.session.lock().await.take() else {
            return Ok(());
        };
        let clear = activity::set_activity(self.pid, None, &Uuid::new_v4().to_string());
        if let Err(e) = exchange(&mut session, &clear).await {
            warn!(error = %e, "failed to clear presence before disconnect");
        }
        write_frame(&mut session, Opcode::Close, &json!({})).await?;
        info!("discord ipc disconnected");
        Ok(())
    }

    async fn establish(&self) -> Result<Session, IpcError> {
        let attempt = async {
            let mut session = self.connector.open().await?;
            handshake(&mut session, &self.client_id).await?;
            Ok::<_, IpcError>(session)
        };
        let session = tokio::time::timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| IpcError::Timeout)??;
        info!(client_id = %self.client_id, "discord ipc handshake complete");
        Ok(session)
    }
}

#[async_trait]
impl PresenceSink for DiscordIpcSink {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransmissionError::Unavailable("discord ipc is disconnected".into()));
        }
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let session = self.establish().await.map_err(|e| {
                debug!(error = %e, "discord ipc reconnect failed");
                TransmissionError::Unavailable(e.to_string())
            })?;
            *guard = Some(session);
        }
        let Some(session) = guard.as_mut() else {
            return Err(TransmissionError::Unavailable("discord ipc is not connected".into()));
        };

        let command = activity::set_activity(self.pid, Some(update), &Uuid::new_v4().to_string());
        match exchange(session, &command).await {
            Ok(reply) if reply["evt"].as_str() == Some("ERROR") => {
                Err(TransmissionError::Rejected(error_message(&reply)))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "discord ipc channel lost");
                *guard = None;
                Err(e.into())
            }
        }
    }
}

/// Send the hello frame and wait for `READY`.
async fn handshake(session: &mut Session, client_id: &str) -> Result<(), IpcError> {
    write_frame(
        session,
        Opcode::Handshake,
        &json!({"v": HANDSHAKE_VERSION, "client_id": client_id}),
    )
    .await?;

    loop {
        let frame = read_frame(session).await?;
        match frame.opcode {
            Opcode::Frame => match frame.payload["evt"].as_str() {
                Some("READY") => return Ok(()),
                Some("ERROR") => return Err(IpcError::Handshake(error_message(&frame.payload))),
                _ => debug!(payload = %frame.payload, "ignoring frame before READY"),
            },
            Opcode::Close => return Err(closed(&frame.payload)),
            Opcode::Ping => write_frame(session, Opcode::Pong, &frame.payload).await?,
            Opcode::Handshake | Opcode::Pong => {}
        }
    }
}

/// Send `command` and wait for the reply carrying the same nonce.
async fn exchange(session: &mut Session, command: &Value) -> Result<Value, IpcError> {
    write_frame(session, Opcode::Frame, command).await?;
    let nonce = &command["nonce"];
    loop {
        let frame = read_frame(session).await?;
        match frame.opcode {
            Opcode::Frame if &frame.payload["nonce"] == nonce => return Ok(frame.payload),
            Opcode::Frame => debug!(payload = %frame.payload, "ignoring unrelated frame"),
            Opcode::Close => return Err(closed(&frame.payload)),
            Opcode::Ping => write_frame(session, Opcode::Pong, &frame.payload).await?,
            Opcode::Handshake | Opcode::Pong => {}
        }
    }
}

fn error_message(payload: &Value) -> String {
    payload["data"]["message"]
        .as_str()
        .unwrap_or("unknown error")
        .to_string()
}

fn closed(payload: &Value) -> IpcError {
    IpcError::Closed {
        code: payload["code"].as_i64().unwrap_or_default(),
        message: payload["message"].as_str().unwrap_or_default().to_string(),
    }
}
