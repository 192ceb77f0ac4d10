//! Record-change notifications.
//!
//! The migration installs AFTER triggers on `records` that `pg_notify` the
//! `record_change` channel on every insert, update or delete. The watcher
//! subscribes with LISTEN and invokes a callback per notification; the only
//! consumer is the cache flush.

use crate::Result;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// The channel the record triggers notify.
pub const CHANNEL: &str = "record_change";

/// Subscriber to the store's `record_change` channel.
pub struct ChangeWatcher {
    listener: PgListener,
}

impl ChangeWatcher {
    /// Connects a dedicated listening session and subscribes.
    pub async fn subscribe(pool: &PgPool) -> Result<Self> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANNEL).await?;
        info!(channel = CHANNEL, "Listening for record changes");
        Ok(Self { listener })
    }

    /// Blocks forever, invoking `on_change` for each notification.
    ///
    /// Connection loss is logged and retried; the listener re-subscribes on
    /// the next receive once the database is reachable again.
    pub async fn run<F>(mut self, on_change: F)
    where
        F: Fn() + Send + Sync,
    {
        loop {
            match self.listener.recv().await {
                Ok(_) => {
                    info!("Record change notification, flushing cache");
                    on_change();
                }
                Err(err) => {
                    warn!(%err, "Change listener error, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
