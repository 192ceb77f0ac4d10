//! # Signet Server
//!
//! The serving side of signet: UDP and TCP DNS listeners feeding a
//! [`QueryHandler`], the authoritative query pipeline, the HTTP API
//! (replication export and status), and the slave synchronization loop.
//!
//! The DNS servers are transport only — all answer policy lives in
//! [`authority::AuthorityHandler`].

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod api;
pub mod authority;
pub mod handler;
pub mod sync;
pub mod tcp;
pub mod udp;

pub use api::{ApiServer, ZoneFile};
pub use authority::AuthorityHandler;
pub use handler::{QueryContext, QueryHandler};
pub use sync::SlaveSync;
pub use tcp::TcpServer;
pub use udp::UdpServer;

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket or stream I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task ended unexpectedly.
    #[error("task error: {0}")]
    Task(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// DNS transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain UDP.
    Udp,
    /// Plain TCP.
    Tcp,
}

impl Protocol {
    /// Returns the protocol name.
    pub const fn name(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which replication role this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Holds the authoritative data; exports it over `/zone-sync`.
    Master,
    /// Mirrors a master; read-only except for the sync loop.
    Slave,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "master" => Ok(Role::Master),
            "slave" => Ok(Role::Slave),
            other => Err(format!("SERVER_ROLE must be 'master' or 'slave', got {other:?}")),
        }
    }
}

/// The DNS server pair: one UDP and one TCP listener on the same address.
pub struct DnsServer {
    addr: SocketAddr,
    handler: Arc<dyn QueryHandler>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DnsServer {
    /// Creates a server for the given listen address.
    pub fn new(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            addr,
            handler,
            shutdown_tx,
        }
    }

    /// Binds and runs both listeners until shutdown.
    pub async fn run(&self) -> Result<()> {
        let udp = UdpServer::bind(self.addr, self.handler.clone()).await?;
        let tcp = TcpServer::bind(self.addr, self.handler.clone()).await?;

        let mut handles = Vec::new();
        for task in [
            spawn_listener(async move { udp.run().await }, self.shutdown_tx.subscribe()),
            spawn_listener(async move { tcp.run().await }, self.shutdown_tx.subscribe()),
        ] {
            handles.push(task);
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| ServerError::Task(e.to_string()))??;
        }
        Ok(())
    }

    /// Initiates shutdown of both listeners.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn spawn_listener(
    server: impl std::future::Future<Output = Result<()>> + Send + 'static,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<Result<()>> {
    tokio::spawn(async move {
        tokio::select! {
            result = server => result,
            _ = shutdown_rx.recv() => Ok(()),
        }
    })
}

#[cfg(test)]
pub(crate) mod testutil;
