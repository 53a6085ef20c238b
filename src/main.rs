//! wat-bridge - WhatsApp side of a WhatsApp-Telegram relay
//!
//! Receives events from the WhatsApp protocol stack as JSON lines on stdin,
//! answers bridge commands, writes protocol commands to stdout and hands
//! relayable messages to the Telegram side.

mod bridge;
mod common;
mod config;
mod protocol;
mod relay;
mod store;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{stdin, stdout, BufReader};
use tokio::signal;
use tracing::{debug, error, info, warn};

use bridge::{ChannelBundle, Dispatcher, MediaStore, SinkChannels};
use config::{env::get_config_path, load_and_validate, Config};
use store::{BridgeStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol wire.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("wat-bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Relay channel: {}", config.bridge.relay_channel);
    info!("  Download dir: {}", config.bridge.download_dir);
    info!(
        "  Store: {}",
        config.store.path.as_deref().unwrap_or("<in-memory>")
    );

    let store = open_store(&config)?;

    // ============================================================
    // Channels and tasks
    // ============================================================
    let ChannelBundle {
        dispatch,
        sinks,
        control,
    } = ChannelBundle::new();
    let SinkChannels {
        protocol_rx,
        relay_rx,
    } = sinks;

    let dispatcher = Dispatcher::new(
        store,
        MediaStore::new(&config.bridge.download_dir),
        dispatch,
        config.bridge.relay_channel.clone(),
    );

    let command_writer = tokio::spawn(async move {
        if let Err(e) = protocol::run_command_writer(stdout(), protocol_rx).await {
            error!("Protocol command writer failed: {}", e);
        }
    });

    let relay_sink = {
        let spool = config.relay.spool.clone();
        tokio::spawn(async move {
            if let Err(e) = relay::run_relay_sink(spool, relay_rx).await {
                error!("Relay sink failed: {}", e);
            }
        })
    };

    let mut feed = {
        let shutdown_rx = control.shutdown_rx.clone();
        tokio::spawn(async move {
            match protocol::run_event_feed(BufReader::new(stdin()), &dispatcher, shutdown_rx).await {
                Ok(count) => info!("Event feed finished after {} events", count),
                Err(e) => error!("Event feed failed: {}", e),
            }
            // Dropping the dispatcher closes the outbound channels.
        })
    };

    // ============================================================
    // Run until input ends or a signal arrives
    // ============================================================
    let interrupted = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            if let Err(e) = control.shutdown_tx.send(true) {
                debug!("Shutdown channel closed: {}", e);
            }
            let timeout = tokio::time::Duration::from_secs(5);
            match tokio::time::timeout(timeout, &mut feed).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Event feed task panicked: {}", e),
                Err(_) => {
                    warn!("Event feed did not stop in time, aborting");
                    feed.abort();
                }
            }
            true
        }
        res = &mut feed => {
            if let Err(e) = res {
                warn!("Event feed task panicked: {}", e);
            }
            false
        }
    };

    // Writers finish once every queued message is flushed.
    for (name, task) in [("command writer", command_writer), ("relay sink", relay_sink)] {
        if let Err(e) = task.await {
            warn!("{} task panicked: {}", name, e);
        }
    }

    info!("Exiting...");
    if interrupted {
        // A pending blocking stdin read would otherwise keep the runtime alive.
        std::process::exit(0);
    }
    Ok(())
}

/// Open the configured store and seed the blacklist and links.
fn open_store(config: &Config) -> Result<Arc<dyn BridgeStore>> {
    let store: Arc<dyn BridgeStore> = match config.store.path.as_deref() {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => {
            warn!("No store.path configured - contacts and links are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    store::seed(store.as_ref(), &config.store)?;
    if config.store.links.is_empty() && config.store.path.is_none() {
        warn!("No store.links configured - /bridgeOn will report every chat as not bridged");
    }

    Ok(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
