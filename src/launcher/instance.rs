//! Handle to a started instance.

use std::net::SocketAddr;

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// One transport the instance is listening on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listening {
    Http(SocketAddr),
    Tcp(SocketAddr),
    Broker { url: String, subjects: Vec<String> },
}

impl Listening {
    /// Metric and log label.
    pub fn kind(&self) -> &'static str {
        match self {
            Listening::Http(_) => "http",
            Listening::Tcp(_) => "tcp",
            Listening::Broker { .. } => "broker",
        }
    }
}

/// A live instance. Dropping the handle does not stop it; call [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct RunningInstance {
    service_name: String,
    listeners: Vec<Listening>,
    tasks: Vec<JoinHandle<()>>,
    shutdown: Shutdown,
}

impl RunningInstance {
    pub(crate) fn new(service_name: impl Into<String>, shutdown: Shutdown) -> Self {
        Self {
            service_name: service_name.into(),
            listeners: Vec::new(),
            tasks: Vec::new(),
            shutdown,
        }
    }

    pub(crate) fn attach(&mut self, listening: Listening, task: JoinHandle<()>) {
        metrics::record_listener_started(listening.kind());
        self.listeners.push(listening);
        self.tasks.push(task);
    }

    pub(crate) fn shutdown_handle(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn listeners(&self) -> &[Listening] {
        &self.listeners
    }

    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.listeners.iter().find_map(|l| match l {
            Listening::Http(addr) => Some(*addr),
            _ => None,
        })
    }

    pub fn transport_addr(&self) -> Option<SocketAddr> {
        self.listeners.iter().find_map(|l| match l {
            Listening::Tcp(addr) => Some(*addr),
            _ => None,
        })
    }

    pub fn broker_subjects(&self) -> Option<&[String]> {
        self.listeners.iter().find_map(|l| match l {
            Listening::Broker { subjects, .. } => Some(subjects.as_slice()),
            _ => None,
        })
    }

    /// True while at least one listener task is still running.
    pub fn is_listening(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stop every listener and wait for them to finish.
    pub async fn shutdown(self) {
        tracing::info!(service = %self.service_name, "Shutting down");
        self.shutdown.trigger();
        self.wait().await;
    }

    /// Wait for every listener task to finish.
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(service = %self.service_name, error = %e, "Listener task failed");
            }
        }
    }
}
