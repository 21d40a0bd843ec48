//! TCP accept loop that reports failures to the user-visible log.
//!
//! axum's own `TcpListener` impl swallows accept errors into `tracing`; this
//! one also appends `HTTP listener error: …` to the [`LogSink`] and keeps
//! accepting.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shadow_core::LogSink;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error};

/// Pause after a non-connection accept error (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

pub(crate) struct LoggedListener {
    inner: TcpListener,
    log: Arc<dyn LogSink>,
}

impl LoggedListener {
    pub(crate) fn new(inner: TcpListener, log: Arc<dyn LogSink>) -> Self {
        Self { inner, log }
    }
}

impl axum::serve::Listener for LoggedListener {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.inner.accept().await {
                Ok(conn) => return conn,
                Err(e) if is_connection_error(&e) => {
                    debug!(error = %e, "connection dropped before accept");
                }
                Err(e) => {
                    error!(error = %e, "http accept failed");
                    self.log.append(&format!("HTTP listener error: {e}"));
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

/// Errors scoped to one peer; the listening socket itself is fine.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
