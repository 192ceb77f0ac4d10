//! End-to-end transport tests: a bound server answering over real sockets.

use async_trait::async_trait;
use signet_cache::RecordCache;
use signet_dnssec::KeyStore;
use signet_proto::{Message, Name, Question, RecordType, ResourceRecord};
use signet_server::{AuthorityHandler, QueryHandler, TcpServer, UdpServer};
use signet_store::{RRsetKey, Result as StoreResult, ZoneStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

/// A store holding one fixed RRset.
struct FixedStore {
    owner: Name,
    records: Vec<ResourceRecord>,
}

#[async_trait]
impl ZoneStore for FixedStore {
    async fn insert_zone(&self, _name: &Name) -> StoreResult<i32> {
        Ok(1)
    }

    async fn zone_names(&self) -> StoreResult<Vec<String>> {
        Ok(vec!["example.com.".to_string()])
    }

    async fn rrset_keys_for_zone(&self, _zone: &Name) -> StoreResult<Vec<RRsetKey>> {
        Ok(vec![RRsetKey {
            name: self.owner.clone(),
            rtype: RecordType::A,
        }])
    }

    async fn query_records(&self, name: &Name, rtype: RecordType) -> StoreResult<Vec<ResourceRecord>> {
        if name == &self.owner && rtype == RecordType::A {
            Ok(self.records.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn query_rrsig(
        &self,
        _name: &Name,
        _covered: RecordType,
    ) -> StoreResult<Option<ResourceRecord>> {
        Ok(None)
    }

    async fn upsert_record(&self, _rr: &ResourceRecord) -> StoreResult<()> {
        Ok(())
    }

    async fn store_rrsig(
        &self,
        _name: &Name,
        _covered: RecordType,
        _rr: &ResourceRecord,
    ) -> StoreResult<()> {
        Ok(())
    }

    async fn delete_zone_records(&self, _zone_id: i32) -> StoreResult<()> {
        Ok(())
    }

    async fn truncate_all(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn fixed_handler() -> Arc<dyn QueryHandler> {
    let owner: Name = "www.example.com.".parse().unwrap();
    let store = Arc::new(FixedStore {
        owner: owner.clone(),
        records: vec![ResourceRecord::a(owner, 300, "1.2.3.4".parse().unwrap())],
    });
    Arc::new(AuthorityHandler::new(
        store,
        Arc::new(RecordCache::new()),
        Arc::new(KeyStore::empty()),
        true,
    ))
}

fn a_query() -> Message {
    Message::query(
        0x3131,
        Question::new("www.example.com.".parse().unwrap(), RecordType::A),
    )
}

#[tokio::test]
async fn udp_query_roundtrip() {
    let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), fixed_handler())
        .await
        .unwrap();
    let addr = server.local_addr();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(&a_query().to_wire(), addr).await.unwrap();

    let mut buf = vec![0u8; 512];
    let (len, _) = timeout(Duration::from_secs(5), client.recv_from(&mut buf))
        .await
        .expect("response before timeout")
        .unwrap();

    let response = Message::parse(&buf[..len]).unwrap();
    assert_eq!(response.id(), 0x3131);
    assert!(response.is_authoritative());
    assert_eq!(response.questions().len(), 1);
    assert_eq!(response.answers().len(), 1);
    assert_eq!(response.answers()[0].to_string(), "www.example.com. 300 IN A 1.2.3.4");
}

#[tokio::test]
async fn tcp_query_roundtrip() {
    let server = TcpServer::bind("127.0.0.1:0".parse().unwrap(), fixed_handler())
        .await
        .unwrap();
    let addr = server.local_addr();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let wire = a_query().to_wire();
    stream
        .write_all(&(wire.len() as u16).to_be_bytes())
        .await
        .unwrap();
    stream.write_all(&wire).await.unwrap();

    let mut len_buf = [0u8; 2];
    timeout(Duration::from_secs(5), stream.read_exact(&mut len_buf))
        .await
        .expect("response before timeout")
        .unwrap();
    let len = u16::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.unwrap();

    let response = Message::parse(&buf).unwrap();
    assert_eq!(response.id(), 0x3131);
    assert!(response.is_authoritative());
    assert_eq!(response.answers().len(), 1);
}

#[tokio::test]
async fn malformed_udp_query_is_dropped() {
    let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), fixed_handler())
        .await
        .unwrap();
    let addr = server.local_addr();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"garbage", addr).await.unwrap();

    // No response is expected; a valid follow-up query still works.
    client.send_to(&a_query().to_wire(), addr).await.unwrap();
    let mut buf = vec![0u8; 512];
    let (len, _) = timeout(Duration::from_secs(5), client.recv_from(&mut buf))
        .await
        .expect("server must survive garbage")
        .unwrap();
    let response = Message::parse(&buf[..len]).unwrap();
    assert_eq!(response.answers().len(), 1);
}
