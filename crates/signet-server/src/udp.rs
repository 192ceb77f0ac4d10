//! UDP server implementation.

use super::handler::{QueryContext, QueryHandler};
use super::{Protocol, Result};
use signet_proto::Message;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace};

/// UDP DNS server.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Binds a UDP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, None)?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;

        info!(addr = %local_addr, "UDP server listening");

        Ok(Self {
            socket: Arc::new(socket),
            handler,
            local_addr,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receives queries forever, spawning a task per query.
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; 65_535];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => {
                    let data = buf[..len].to_vec();
                    let socket = self.socket.clone();
                    let handler = self.handler.clone();

                    tokio::spawn(async move {
                        if let Err(e) = process_query(socket, handler, data, src).await {
                            debug!(error = %e, client = %src, "Error processing UDP query");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error receiving UDP packet");
                }
            }
        }
    }
}

async fn process_query(
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    data: Vec<u8>,
    src: SocketAddr,
) -> Result<()> {
    let query = match Message::parse_query(&data) {
        Ok(msg) => msg,
        Err(e) => {
            trace!(error = %e, client = %src, "Dropping malformed UDP query");
            return Ok(());
        }
    };

    let ctx = QueryContext::new(src, Protocol::Udp);
    let mut response = handler.handle(query, ctx.clone()).await;

    let max_size = ctx.max_response_size();
    if response.wire_len() > max_size {
        response.truncate_to(max_size);
    }

    // A failed send only loses this one answer.
    if let Err(e) = socket.send_to(&response.to_wire(), src).await {
        debug!(error = %e, client = %src, "Failed to send UDP response");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RefusedHandler;

    #[tokio::test]
    async fn binds_an_ephemeral_port() {
        let handler = Arc::new(RefusedHandler);
        let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), handler)
            .await
            .unwrap();
        assert!(server.local_addr().port() > 0);
    }
}
