//! Query handler interface.

use async_trait::async_trait;
use signet_proto::Message;
use std::net::SocketAddr;
use std::time::Instant;

use super::Protocol;

/// Context for one DNS query.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Client address.
    pub client: SocketAddr,
    /// Transport the query arrived on.
    pub protocol: Protocol,
    /// When the query was received.
    pub received_at: Instant,
}

impl QueryContext {
    /// Creates a new query context.
    pub fn new(client: SocketAddr, protocol: Protocol) -> Self {
        Self {
            client,
            protocol,
            received_at: Instant::now(),
        }
    }

    /// Returns the maximum response size for this transport.
    ///
    /// Without EDNS the UDP limit is the classic 512 octets.
    pub fn max_response_size(&self) -> usize {
        match self.protocol {
            Protocol::Udp => 512,
            Protocol::Tcp => 65_535,
        }
    }

    /// Returns the time elapsed since the query was received.
    pub fn elapsed(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

/// Turns a DNS query into a response.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Handles one query message.
    async fn handle(&self, query: Message, context: QueryContext) -> Message;
}

/// Handler returning REFUSED for everything; for transport tests.
pub struct RefusedHandler;

#[async_trait]
impl QueryHandler for RefusedHandler {
    async fn handle(&self, query: Message, _context: QueryContext) -> Message {
        let mut response = Message::response_from(&query);
        response.set_rcode(signet_proto::Rcode::Refused);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_response_size_by_transport() {
        let udp = QueryContext::new("127.0.0.1:1234".parse().unwrap(), Protocol::Udp);
        assert_eq!(udp.max_response_size(), 512);

        let tcp = QueryContext::new("127.0.0.1:1234".parse().unwrap(), Protocol::Tcp);
        assert_eq!(tcp.max_response_size(), 65_535);
    }
}
