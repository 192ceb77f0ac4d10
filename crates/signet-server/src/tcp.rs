//! TCP server implementation.
//!
//! DNS over TCP frames each message with a two-byte length prefix
//! (RFC 1035 section 4.2.2). Connections are read in a loop until the
//! client closes or the idle timeout fires.

use super::handler::{QueryContext, QueryHandler};
use super::{Protocol, Result};
use signet_proto::Message;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

/// TCP DNS server.
pub struct TcpServer {
    listener: TcpListener,
    handler: Arc<dyn QueryHandler>,
    local_addr: SocketAddr,
    idle_timeout: Duration,
}

impl TcpServer {
    /// Binds a TCP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "TCP server listening");

        Ok(Self {
            listener,
            handler,
            local_addr,
            idle_timeout: Duration::from_secs(10),
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, spawning a task per connection.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let handler = self.handler.clone();
                    let idle_timeout = self.idle_timeout;

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, handler, idle_timeout).await
                        {
                            debug!(error = %e, client = %peer, "TCP connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error accepting TCP connection");
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<dyn QueryHandler>,
    idle_timeout: Duration,
) -> Result<()> {
    trace!(client = %peer, "New TCP connection");

    loop {
        match timeout(idle_timeout, read_message(&mut stream)).await {
            Ok(Ok(query_bytes)) => {
                let query = match Message::parse_query(&query_bytes) {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(error = %e, client = %peer, "Dropping malformed TCP query");
                        continue;
                    }
                };

                let ctx = QueryContext::new(peer, Protocol::Tcp);
                let response = handler.handle(query, ctx).await;
                write_message(&mut stream, &response.to_wire()).await?;
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    trace!(client = %peer, "TCP connection closed by client");
                } else {
                    debug!(error = %e, client = %peer, "TCP read error");
                }
                break;
            }
            Err(_) => {
                trace!(client = %peer, "TCP connection idle timeout");
                break;
            }
        }
    }

    Ok(())
}

/// Reads one length-prefixed DNS message.
async fn read_message(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = u16::from_be_bytes(len_buf) as usize;

    if len == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "zero-length TCP message",
        ));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Writes one length-prefixed DNS message.
async fn write_message(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    stream.write_all(&(data.len() as u16).to_be_bytes()).await?;
    stream.write_all(data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RefusedHandler;

    #[tokio::test]
    async fn binds_an_ephemeral_port() {
        let handler = Arc::new(RefusedHandler);
        let server = TcpServer::bind("127.0.0.1:0".parse().unwrap(), handler)
            .await
            .unwrap();
        assert!(server.local_addr().port() > 0);
    }
}
