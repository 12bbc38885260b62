//! Point-to-point socket transport.
//!
//! One task per connection. Frames on a connection are handled in arrival
//! order and answered on the same connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, watch};

use crate::config::TcpTransportConfig;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::transport::codec::{self, CodecError, FrameReader};
use crate::transport::dispatch::Dispatcher;
use crate::transport::envelope::{IncomingRequest, OutgoingResponse};

/// How long shutdown waits for open connections to finish their current frame.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Socket server bound and ready to accept.
pub struct TcpTransport {
    listener: Listener,
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
    tracker: ConnectionTracker,
}

impl TcpTransport {
    pub async fn bind(config: &TcpTransportConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, ListenerError> {
        let listener = Listener::bind(config).await?;
        Ok(Self {
            listener,
            dispatcher,
            max_frame_bytes: config.max_frame_bytes,
            tracker: ConnectionTracker::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) {
        let (stop_tx, stop_rx) = watch::channel(false);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let connection = Connection {
                            dispatcher: self.dispatcher.clone(),
                            max_frame_bytes: self.max_frame_bytes,
                            peer,
                        };
                        let guard = self.tracker.track();
                        let stop = stop_rx.clone();
                        tokio::spawn(async move {
                            tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Connection opened");
                            connection.run(stream, permit, stop).await;
                            drop(guard);
                        });
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        let _ = stop_tx.send(true);
        let open = self.tracker.active_count();
        if open > 0 {
            tracing::info!(open_connections = open, "Draining connections");
            if tokio::time::timeout(DRAIN_TIMEOUT, self.tracker.drained()).await.is_err() {
                tracing::warn!(
                    open_connections = self.tracker.active_count(),
                    "Drain timed out"
                );
            }
        }
        tracing::info!("Socket transport stopped");
    }
}

struct Connection {
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
    peer: SocketAddr,
}

impl Connection {
    async fn run(self, stream: TcpStream, _permit: ConnectionPermit, mut stop: watch::Receiver<bool>) {
        let (read, mut write) = stream.into_split();
        let mut frames = FrameReader::new(BufReader::new(read), self.max_frame_bytes);

        loop {
            let frame = tokio::select! {
                frame = frames.next_frame() => frame,
                _ = stop.wait_for(|stopped| *stopped) => break,
            };

            let payload = match frame {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(e) => {
                    self.dispatcher
                        .logger()
                        .warn(&format!("closing connection from {}: {}", self.peer, e));
                    break;
                }
            };

            let request: IncomingRequest = match serde_json::from_slice(&payload) {
                Ok(request) => request,
                Err(e) => {
                    self.dispatcher
                        .logger()
                        .warn(&format!("dropping malformed frame from {}: {}", self.peer, e));
                    continue;
                }
            };

            if let Some(response) = self.dispatcher.handle(request).await {
                if let Err(e) = codec::write_frame(&mut write, &response).await {
                    tracing::debug!(peer_addr = %self.peer, error = %e, "Failed to write response");
                    break;
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Remote error: {0}")]
    Remote(Value),

    #[error("Connection closed before a response arrived")]
    Closed,
}

/// Minimal client for the socket transport.
pub struct TcpClient {
    frames: FrameReader<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TcpClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        Self::connect_with_limit(addr, TcpTransportConfig::default().max_frame_bytes).await
    }

    pub async fn connect_with_limit(addr: impl ToSocketAddrs, max_frame_bytes: usize) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read, writer) = stream.into_split();
        Ok(Self {
            frames: FrameReader::new(BufReader::new(read), max_frame_bytes),
            writer,
        })
    }

    /// Send a request and wait for its reply.
    pub async fn send(&mut self, pattern: &str, data: Value) -> Result<Value, ClientError> {
        let request = IncomingRequest::request(pattern, data);
        let id = request.id.clone();
        codec::write_frame(&mut self.writer, &request).await?;

        while let Some(response) = self.frames.next_json::<OutgoingResponse>().await? {
            if Some(&response.id) != id.as_ref() {
                continue;
            }
            return match (response.err, response.response) {
                (Some(err), _) => Err(ClientError::Remote(err)),
                (None, value) => Ok(value.unwrap_or(Value::Null)),
            };
        }
        Err(ClientError::Closed)
    }

    /// Send an event. No reply is expected.
    pub async fn emit(&mut self, pattern: &str, data: Value) -> Result<(), ClientError> {
        codec::write_frame(&mut self.writer, &IncomingRequest::event(pattern, data)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MessageRouter;
    use crate::lifecycle::Shutdown;
    use crate::observability::TracingLogger;
    use crate::validation::{RpcException, ValidationPipe};
    use serde::Deserialize;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    struct Add {
        a: i64,
        b: i64,
    }

    async fn start() -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
        let router = MessageRouter::new().on("add", |add: Add| async move {
            Ok::<_, RpcException>(add.a + add.b)
        });
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(ValidationPipe::strict()),
            TracingLogger::shared("test"),
            "tcp",
        );
        let config = TcpTransportConfig {
            port: 0,
            ..TcpTransportConfig::default()
        };
        let transport = TcpTransport::bind(&config, Arc::new(dispatcher)).await.unwrap();
        let addr = transport.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(transport.serve(shutdown.subscribe()));
        (addr, shutdown, handle)
    }

    #[tokio::test]
    async fn test_request_reply() {
        let (addr, shutdown, handle) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        assert_eq!(client.send("add", json!({ "a": 2, "b": 3 })).await.unwrap(), json!(5));
        assert_eq!(client.send("add", json!({ "a": 1, "b": 1 })).await.unwrap(), json!(2));

        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_errors_surface() {
        let (addr, shutdown, _handle) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        match client.send("add", json!({ "a": 2 })).await {
            Err(ClientError::Remote(err)) => assert_eq!(err["message"][0]["property"], "b"),
            other => panic!("expected remote error, got {other:?}"),
        }
        match client.send("sub", json!({})).await {
            Err(ClientError::Remote(err)) => {
                assert_eq!(err["message"], crate::descriptor::NO_HANDLER)
            }
            other => panic!("expected remote error, got {other:?}"),
        }
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_events_get_no_reply() {
        let (addr, shutdown, _handle) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        client.emit("add", json!({ "a": 1, "b": 2 })).await.unwrap();
        // The next reply on the wire must belong to the request, not the event.
        assert_eq!(client.send("add", json!({ "a": 4, "b": 4 })).await.unwrap(), json!(8));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_corrupt_frame_closes_connection() {
        let (addr, shutdown, _handle) = start().await;
        let mut raw = TcpStream::connect(addr).await.unwrap();
        raw.write_all(b"abc#{}").await.unwrap();

        let (read, _write) = raw.into_split();
        let mut frames = FrameReader::new(BufReader::new(read), 1024);
        assert!(!matches!(frames.next_frame().await, Ok(Some(_))));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connections() {
        let (addr, shutdown, handle) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();
        assert_eq!(client.send("add", json!({ "a": 0, "b": 0 })).await.unwrap(), json!(0));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(matches!(
            client.send("add", json!({ "a": 0, "b": 0 })).await,
            Err(ClientError::Closed) | Err(ClientError::Codec(_))
        ));
    }
}
