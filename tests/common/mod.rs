//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use service_bootstrap::config::{AppConfig, ServiceConfig, TcpTransportConfig};
use service_bootstrap::observability::{Logger, SharedLogger};

/// Logger that keeps every line for assertions.
#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Log,
    Warn,
    Error,
}

impl MemoryLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        self.push(Level::Log, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}

pub fn shared(logger: &Arc<MemoryLogger>) -> Option<SharedLogger> {
    Some(logger.clone())
}

/// Service config on a free loopback port.
pub fn service_config(name: &str) -> ServiceConfig {
    ServiceConfig {
        service_name: name.to_string(),
        tcp: TcpTransportConfig {
            host: "127.0.0.1".into(),
            port: 0,
            ..TcpTransportConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// App config on a free loopback port under `/api`.
pub fn app_config(name: &str) -> AppConfig {
    AppConfig {
        service: service_config(name),
        host: "127.0.0.1".into(),
        port: 0,
        prefix: "/api".into(),
    }
}

/// A broker URL nothing is listening on.
pub async fn unreachable_nats_url() -> String {
    let socket = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    drop(socket);
    format!("nats://127.0.0.1:{}", port)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Single-client NATS server speaking just enough of the text protocol
/// for connect, subscribe, publish and flush.
///
/// Client lines (except PING/PONG) are handed to the test; raw protocol
/// text sent with [`StubBroker::send`] is written to the client as is.
pub struct StubBroker {
    pub url: String,
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<String>,
}

impl StubBroker {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (line_tx, from_client) = mpsc::unbounded_channel();
        let (to_client, mut raw_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();

            let info = format!(
                "INFO {{\"server_id\":\"stub\",\"server_name\":\"stub\",\"version\":\"2.10.0\",\"go\":\"go1.22\",\"host\":\"127.0.0.1\",\"port\":{},\"headers\":true,\"max_payload\":1048576,\"proto\":1}}\r\n",
                addr.port()
            );
            if write.write_all(info.as_bytes()).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    line = lines.next_line() => match line {
                        Ok(Some(line)) if line.starts_with("PING") => {
                            if write.write_all(b"PONG\r\n").await.is_err() {
                                return;
                            }
                        }
                        Ok(Some(line)) if line.starts_with("PONG") => {}
                        Ok(Some(line)) => {
                            let _ = line_tx.send(line);
                        }
                        _ => return,
                    },
                    Some(raw) = raw_rx.recv() => {
                        if write.write_all(raw.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            url: format!("nats://{}", addr),
            from_client,
            to_client,
        }
    }

    /// Next protocol line from the client.
    pub async fn next_line(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("broker client went quiet")
            .expect("broker connection closed")
    }

    /// Wait for the `SUB` on `subject` and return its subscription id.
    pub async fn subscription(&mut self, subject: &str) -> String {
        let prefix = format!("SUB {} ", subject);
        loop {
            let line = self.next_line().await;
            if line.starts_with(&prefix) {
                return line.split_whitespace().last().unwrap().to_string();
            }
        }
    }

    /// Deliver `payload` on `subject` with a reply subject.
    pub fn deliver(&self, subject: &str, sid: &str, reply: &str, payload: &str) {
        let raw = format!(
            "MSG {} {} {} {}\r\n{}\r\n",
            subject,
            sid,
            reply,
            payload.len(),
            payload
        );
        self.to_client.send(raw).unwrap();
    }

    /// Wait for a publish to `subject` and return its payload.
    pub async fn published(&mut self, subject: &str) -> String {
        let prefix = format!("PUB {} ", subject);
        loop {
            let line = self.next_line().await;
            if line.starts_with(&prefix) {
                return self.next_line().await;
            }
        }
    }
}
