//! `Stopped` ⇄ `Running` lifecycle around the axum accept loop.
//!
//! `start` binds and spawns one background task running the accept loop.
//! `stop` cancels it: the socket is released immediately, in-flight requests
//! run to completion (bounded by [`DRAIN_TIMEOUT`]). Both calls are
//! idempotent. Accept failures are appended to the log sink and the loop
//! keeps going.
//!
//! Requests are served concurrently. Two racing updates both reach the sink,
//! in an order that depends on scheduling; the last one published is what
//! Discord shows.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shadow_core::{Dispatcher, LogSink};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::accept::LoggedListener;
use crate::config::ListenerConfig;
use crate::routes::{AppState, build_router};

/// How long `stop` waits for in-flight requests before returning anyway.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Listener start-up failures.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The address could not be bound (in use, not permitted, unresolvable).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested `host:port`.
        addr: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The bound socket could not report its address.
    #[error("listener io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    /// Not bound.
    Stopped,
    /// Bound and accepting.
    Running,
}

struct Running {
    addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// The `/update_rpc` HTTP listener.
pub struct Listener {
    config: ListenerConfig,
    app: AppState,
    running: Mutex<Option<Running>>,
}

impl Listener {
    /// Create a stopped listener.
    pub fn new(config: ListenerConfig, dispatcher: Dispatcher, log: Arc<dyn LogSink>) -> Self {
        Self {
            config,
            app: AppState { dispatcher, log },
            running: Mutex::new(None),
        }
    }

    /// Bind and start accepting. Returns the bound address.
    ///
    /// Already running: returns the current address without rebinding.
    pub async fn start(&self) -> Result<SocketAddr, ListenerError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            return Ok(current.addr);
        }

        let host = self.config.host.as_str();
        let listener = match TcpListener::bind((host, self.config.port)).await {
            Ok(listener) => listener,
            Err(source) => {
                error!(host, port = self.config.port, error = %source, "failed to bind listener");
                self.app
                    .log
                    .append(&format!("Failed to start HTTP listener: {source}"));
                return Err(ListenerError::Bind {
                    addr: format!("{host}:{}", self.config.port),
                    source,
                });
            }
        };
        let addr = listener.local_addr()?;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let router = build_router(self.app.clone(), self.config.max_body_bytes);
        let listener = LoggedListener::new(listener, self.app.log.clone());
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { cancelled.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "http accept loop exited with error");
            }
        });

        info!(%addr, "listener started");
        self.app
            .log
            .append(&format!("HTTP server started at http://{addr}/"));
        *running = Some(Running {
            addr,
            token,
            task,
        });
        Ok(addr)
    }

    /// Stop accepting and wait for in-flight requests. No-op when stopped.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.token.cancel();
        match tokio::time::timeout(DRAIN_TIMEOUT, running.task).await {
            Ok(Ok(())) => info!(addr = %running.addr, "listener stopped"),
            Ok(Err(e)) => warn!(addr = %running.addr, error = %e, "accept loop ended abnormally"),
            Err(_) => warn!(
                addr = %running.addr,
                "requests still in flight after {DRAIN_TIMEOUT:?}, not waiting further"
            ),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ListenerState {
        if self.running.lock().await.is_some() {
            ListenerState::Running
        } else {
            ListenerState::Stopped
        }
    }

    /// Bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingLog, RecordingSink};
    use shadow_core::SerializedSink;
    use tokio::io::AsyncWriteExt;

    fn listener(sink: &Arc<RecordingSink>, log: &Arc<RecordingLog>) -> Listener {
        Listener::new(
            ListenerConfig::ephemeral(),
            Dispatcher::new(sink.clone()),
            log.clone(),
        )
    }

    fn update_url(addr: SocketAddr) -> String {
        format!("http://{addr}/update_rpc")
    }

    async fn wait_for_publish_start(sink: &RecordingSink) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.started() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn starts_stopped() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        assert_eq!(listener.state().await, ListenerState::Stopped);
        assert!(listener.local_addr().await.is_none());
    }

    #[tokio::test]
    async fn serves_update_over_http() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        let addr = listener.start().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(listener.state().await, ListenerState::Running);

        let resp = reqwest::Client::new()
            .post(update_url(addr))
            .body(r#"{"activity_name": "Obby"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "RPC updated successfully");
        assert_eq!(sink.published()[0].state, "Obby");

        let lines = log.lines();
        assert_eq!(lines[0], format!("HTTP server started at http://{addr}/"));
        assert_eq!(lines[1], "Update: State='Obby', Details='', ButtonCount='0'");

        listener.stop().await;
    }

    #[tokio::test]
    async fn wrong_method_over_http_is_405() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        let addr = listener.start().await.unwrap();

        let resp = reqwest::get(update_url(addr)).await.unwrap();
        assert_eq!(resp.status(), 405);
        assert!(sink.published().is_empty());

        listener.stop().await;
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);

        let first = listener.start().await.unwrap();
        let second = listener.start().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(log.lines().len(), 1);

        listener.stop().await;
    }

    #[tokio::test]
    async fn stop_releases_socket_and_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        let addr = listener.start().await.unwrap();

        listener.stop().await;
        listener.stop().await;
        assert_eq!(listener.state().await, ListenerState::Stopped);

        let result = reqwest::Client::new()
            .post(update_url(addr))
            .body("{}")
            .send()
            .await;
        assert!(result.is_err());

        // The port is free again.
        let rebound = TcpListener::bind(addr).await;
        assert!(rebound.is_ok());
    }

    #[tokio::test]
    async fn restart_after_stop() {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);

        let _ = listener.start().await.unwrap();
        listener.stop().await;
        let addr = listener.start().await.unwrap();

        let resp = reqwest::Client::new()
            .post(update_url(addr))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        listener.stop().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(RecordingLog::default());
        let listener = Listener::new(
            ListenerConfig {
                port,
                ..ListenerConfig::default()
            },
            Dispatcher::new(sink.clone()),
            log.clone(),
        );

        let err = listener.start().await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert_eq!(listener.state().await, ListenerState::Stopped);
        assert!(log.lines()[0].starts_with("Failed to start HTTP listener:"));
    }

    #[tokio::test]
    async fn concurrent_updates_all_reach_serialized_sink() {
        let sink = Arc::new(RecordingSink::default());
        let serialized = Arc::new(SerializedSink::new(sink.clone()));
        let log = Arc::new(RecordingLog::default());
        let listener = Listener::new(
            ListenerConfig::ephemeral(),
            Dispatcher::new(serialized),
            log.clone(),
        );
        let addr = listener.start().await.unwrap();

        let client = reqwest::Client::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let client = client.clone();
            let url = update_url(addr);
            handles.push(tokio::spawn(async move {
                client
                    .post(url)
                    .body(format!(r#"{{"activity_state": "state {i}"}}"#))
                    .send()
                    .await
                    .unwrap()
                    .status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 200);
        }

        let mut states: Vec<String> = sink.published().into_iter().map(|u| u.state).collect();
        states.sort();
        assert_eq!(states.len(), 16);
        assert!(states.contains(&"state 0".to_string()));
        assert!(states.contains(&"state 15".to_string()));

        listener.stop().await;
    }

    #[tokio::test]
    async fn caller_hanging_up_does_not_cancel_publish() {
        let sink = Arc::new(RecordingSink::slow(Duration::from_millis(300)));
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        let addr = listener.start().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"POST /update_rpc HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\n\r\n{}",
            )
            .await
            .unwrap();
        wait_for_publish_start(&sink).await;
        drop(stream);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(sink.published().len(), 1);
        assert_eq!(
            log.lines().last().unwrap(),
            "Update: State='Playing Roblox', Details='', ButtonCount='0'"
        );

        listener.stop().await;
    }

    #[tokio::test]
    async fn stop_lets_in_flight_request_finish() {
        let sink = Arc::new(RecordingSink::slow(Duration::from_millis(200)));
        let log = Arc::new(RecordingLog::default());
        let listener = listener(&sink, &log);
        let addr = listener.start().await.unwrap();

        let request = tokio::spawn(
            reqwest::Client::new()
                .post(update_url(addr))
                .body(r#"{"activity_state": "Finishing"}"#)
                .send(),
        );
        wait_for_publish_start(&sink).await;
        listener.stop().await;

        let resp = request.await.unwrap().unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(sink.published()[0].state, "Finishing");
        assert_eq!(listener.state().await, ListenerState::Stopped);
    }
}
