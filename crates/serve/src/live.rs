//! Live-reload WebSocket channel.
//!
//! Listens on a TCP port, upgrades connections to WebSocket, and
//! pushes a `deployment_changed` envelope to every subscriber whenever
//! the deployment pointer advances. Clients compare the pushed id
//! against the one captured at their own session start and surface a
//! dismissible prompt — the server never forces a reload.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use statichost_protocol::envelope::Message;
use statichost_protocol::functions::FunctionName;
use statichost_protocol::messages::DeploymentChangedEvent;
use statichost_protocol::types::DeploymentInfo;

use crate::ServeError;

/// Server configuration.
#[derive(Debug, Clone, Default)]
pub struct LiveReloadConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

/// The live-reload WebSocket server.
///
/// Each connection gets its own clone of the pointer watch channel;
/// subscribers that connect after an advance still observe the latest
/// value immediately.
pub struct LiveReloadServer {
    port: u16,
    pointer_rx: watch::Receiver<Option<DeploymentInfo>>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl LiveReloadServer {
    /// Creates a new server over a pointer subscription
    /// (see `DeploymentTracker::subscribe`).
    pub fn new(
        config: LiveReloadConfig,
        pointer_rx: watch::Receiver<Option<DeploymentInfo>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            port: config.port,
            pointer_rx,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server and all subscriber connections.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServeError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("live-reload server listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("live-reload server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::debug!(%peer_addr, "subscriber connection ended: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Handles one subscriber: sends the current pointer, then pushes
    /// every subsequent change until the client or server goes away.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServeError> {
        let ws_stream = accept_async(stream).await?;
        tracing::debug!(%peer_addr, "live-reload subscriber connected");

        let (mut sink, mut reader) = ws_stream.split();
        let mut rx = self.pointer_rx.clone();

        // The session-start value the client will compare against.
        let initial = rx.borrow_and_update().clone();
        if let Some(info) = initial {
            send_changed(&mut sink, &info).await?;
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }

                changed = rx.changed() => {
                    match changed {
                        Ok(()) => {
                            let info = rx.borrow_and_update().clone();
                            if let Some(info) = info {
                                send_changed(&mut sink, &info).await?;
                            }
                        }
                        // Tracker dropped; nothing further to push.
                        Err(_) => break,
                    }
                }

                incoming = reader.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        // Push-only channel; client frames are ignored.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(())
    }
}

async fn send_changed<S>(sink: &mut S, info: &DeploymentInfo) -> Result<(), ServeError>
where
    S: futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let event = DeploymentChangedEvent {
        current_deployment_id: info.current_deployment_id.clone(),
    };
    let msg = Message::new(
        Uuid::new_v4().to_string(),
        FunctionName::DeploymentChanged,
        Some(&event),
    )?;
    sink.send(WsMessage::Text(serde_json::to_string(&msg)?.into()))
        .await?;
    Ok(())
}
