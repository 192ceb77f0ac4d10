//! The authoritative query pipeline.
//!
//! For each question: normalize the name, consult the cache, fall back to
//! the store (memoizing the result), and for non-empty RRsets attach a
//! signature — the stored one when present, otherwise one produced on the
//! spot with the longest-suffix matching zone key and written back
//! best-effort. DNSKEY questions for a loaded apex additionally get the
//! published DNSKEY appended.
//!
//! Store failures degrade to an empty answer for the affected question;
//! signing failures degrade to an unsigned answer. Nothing here is fatal.

use crate::handler::{QueryContext, QueryHandler};
use async_trait::async_trait;
use signet_cache::RecordCache;
use signet_dnssec::{sign_rrset, KeyStore};
use signet_proto::{Message, RecordType, ResourceRecord};
use signet_store::ZoneStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// The [`QueryHandler`] of an authoritative signet instance.
pub struct AuthorityHandler {
    store: Arc<dyn ZoneStore>,
    cache: Arc<RecordCache>,
    keystore: Arc<KeyStore>,
    cache_negative: bool,
}

impl AuthorityHandler {
    /// Creates the handler.
    ///
    /// `cache_negative` controls whether empty RRsets are memoized; a cached
    /// negative stays negative until the next cache flush.
    pub fn new(
        store: Arc<dyn ZoneStore>,
        cache: Arc<RecordCache>,
        keystore: Arc<KeyStore>,
        cache_negative: bool,
    ) -> Self {
        Self {
            store,
            cache,
            keystore,
            cache_negative,
        }
    }

    /// Resolves one RRset through the cache, falling back to the store.
    ///
    /// Returns `None` when the store failed; the caller then leaves the
    /// answer section empty for this question.
    async fn lookup(
        &self,
        qname: &signet_proto::Name,
        qtype: RecordType,
    ) -> Option<Vec<ResourceRecord>> {
        if let Some(records) = self.cache.get(qname, qtype) {
            return Some(records.as_ref().clone());
        }

        match self.store.query_records(qname, qtype).await {
            Ok(records) => {
                if !records.is_empty() || self.cache_negative {
                    self.cache.set(qname, qtype, records.clone());
                }
                Some(records)
            }
            Err(err) => {
                warn!(name = %qname, rtype = %qtype, %err, "Store lookup failed");
                None
            }
        }
    }

    /// Finds or produces the RRSIG for a non-empty RRset.
    async fn signature(
        &self,
        qname: &signet_proto::Name,
        qtype: RecordType,
        rrset: &[ResourceRecord],
    ) -> Option<ResourceRecord> {
        let stored = match self.store.query_rrsig(qname, qtype).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(name = %qname, rtype = %qtype, %err, "RRSIG lookup failed");
                None
            }
        };
        if let Some(sig) = stored {
            return Some(sig);
        }

        let (zone, keypair) = self.keystore.best_match(qname)?;
        match sign_rrset(rrset, zone, keypair) {
            Ok(sig) => {
                if let Err(err) = self.store.store_rrsig(qname, qtype, &sig).await {
                    warn!(name = %qname, rtype = %qtype, %err, "Failed to persist RRSIG");
                }
                Some(sig)
            }
            Err(err) => {
                warn!(name = %qname, zone = %zone, %err, "Signing failed, serving unsigned");
                None
            }
        }
    }
}

#[async_trait]
impl QueryHandler for AuthorityHandler {
    async fn handle(&self, query: Message, context: QueryContext) -> Message {
        let mut response = Message::response_from(&query);
        response.set_authoritative(true);

        for question in query.questions() {
            let qname = question.qname.lowercased();
            let qtype = question.qtype;
            debug!(client = %context.client, name = %qname, rtype = %qtype, "Query");

            let Some(records) = self.lookup(&qname, qtype).await else {
                continue;
            };
            if records.is_empty() {
                continue;
            }

            let signature = self.signature(&qname, qtype, &records).await;
            response.add_answers(records);
            if let Some(sig) = signature {
                response.add_answer(sig);
            }
        }

        // DNSKEY questions at a loaded apex always yield the published key.
        for question in query.questions() {
            if question.qtype == RecordType::DNSKEY {
                let qname = question.qname.lowercased();
                if let Some(keypair) = self.keystore.get(&qname) {
                    response.add_answer(keypair.dnskey_record().clone());
                }
            }
        }

        response
    }
}
