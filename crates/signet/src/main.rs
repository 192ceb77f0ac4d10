//! signetd — minimal authoritative DNS server with online DNSSEC signing
//! and master/slave replication over HTTP.
//!
//! One binary, four jobs: `run` serves DNS and the HTTP API in the
//! configured role; `genkey`, `sign-zone` and `resign-all` are the offline
//! key and signing tools. Configuration comes from the environment (see
//! `config.rs`); setup failures exit non-zero, runtime faults are logged
//! and survived.

mod config;
mod tools;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use parking_lot::RwLock;
use signet_cache::RecordCache;
use signet_dnssec::KeyStore;
use signet_server::api::{ApiServer, ApiState};
use signet_server::{AuthorityHandler, DnsServer, Role, SlaveSync};
use signet_store::{ChangeWatcher, PgStore, ZoneStore};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Signet authoritative DNS server.
#[derive(Parser, Debug)]
#[command(name = "signetd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server in the role given by SERVER_ROLE (default).
    Run,

    /// Generate a zone keypair and publish its DNSKEY.
    Genkey {
        /// Zone apex, e.g. example.com.
        zone: String,
    },

    /// (Re)sign every RRset of one zone.
    SignZone {
        /// Zone apex, e.g. example.com.
        zone: String,
    },

    /// Re-sign every zone with a loaded keypair.
    ResignAll,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("configuration error")?;
    init_tracing(config.log_json);

    let store = PgStore::connect(&config.db_url)
        .await
        .context("DB connection failed")?;
    store.migrate().await.context("DB migration failed")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, store).await,
        Commands::Genkey { zone } => tools::genkey(&store, &config.secrets_dir, &zone).await,
        Commands::SignZone { zone } => {
            let keystore =
                KeyStore::load(&config.secrets_dir).context("loading secrets directory")?;
            tools::sign_zone(&store, &keystore, &zone).await
        }
        Commands::ResignAll => {
            let keystore =
                KeyStore::load(&config.secrets_dir).context("loading secrets directory")?;
            tools::resign_all(&store, &keystore).await
        }
    }
}

async fn run(config: Config, store: PgStore) -> Result<()> {
    info!(role = %config.role, "Starting signetd");

    let cache = Arc::new(RecordCache::new());
    let last_sync = Arc::new(RwLock::new(None));

    // Masters sign online; slaves serve whatever signatures they mirrored.
    let keystore = match config.role {
        Role::Master => Arc::new(
            KeyStore::load(&config.secrets_dir).context("DNSSEC key load failed")?,
        ),
        Role::Slave => Arc::new(KeyStore::empty()),
    };
    if config.role == Role::Master {
        info!(zones = keystore.len(), "DNSSEC keys loaded");
    }

    let shared_store: Arc<dyn ZoneStore> = Arc::new(store.clone());

    // HTTP API runs in both roles; only masters expose /zone-sync.
    let api = ApiServer::new(ApiState {
        store: shared_store.clone(),
        keystore: keystore.clone(),
        role: config.role,
        last_sync: last_sync.clone(),
    });
    let http_listen = config.http_listen;
    tokio::spawn(async move {
        if let Err(err) = api.run(http_listen).await {
            error!(%err, "HTTP API server failed");
        }
    });

    match config.role {
        Role::Master => {
            // Cache invalidation is driven by the store's NOTIFY channel.
            let watcher = ChangeWatcher::subscribe(store.pool())
                .await
                .context("subscribing to record changes")?;
            let watch_cache = cache.clone();
            tokio::spawn(async move {
                watcher.run(move || watch_cache.clear()).await;
            });
        }
        Role::Slave => {
            let sync = SlaveSync::new(shared_store.clone(), cache.clone(), last_sync.clone());
            sync.reset().await.context("failed to reset slave store")?;

            let master_url = config
                .master_url
                .clone()
                .context("MASTER_URL missing for slave")?;
            let interval = config.sync_interval;
            tokio::spawn(async move {
                if let Err(err) = sync.run(master_url, interval).await {
                    error!(%err, "Slave sync loop failed");
                }
            });
        }
    }

    let handler = Arc::new(AuthorityHandler::new(
        shared_store,
        cache,
        keystore,
        config.cache_negative,
    ));
    let dns = Arc::new(DnsServer::new(config.dns_listen, handler));

    // SIGTERM/SIGINT initiate a shutdown of the DNS listeners.
    let shutdown_dns = dns.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(err) => {
                warn!(%err, "Failed to register SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Received SIGINT, shutting down"),
                Err(err) => warn!(%err, "Signal handler error"),
            },
        }
        shutdown_dns.shutdown();
    });

    dns.run().await.context("DNS server failed")?;
    info!("signetd stopped");
    Ok(())
}
