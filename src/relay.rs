//! Relay sink for the Telegram side.
//!
//! Drains relay messages and appends them to a JSON-lines spool file, or
//! logs them when no spool is configured.

use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::common::RelayMessage;

/// Run the relay sink until the channel closes.
pub async fn run_relay_sink(
    spool: Option<String>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
) -> std::io::Result<()> {
    match spool {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            info!("Relaying to spool file {}", path);
            spool_messages(file, relay_rx).await
        }
        None => {
            log_messages(relay_rx).await;
            Ok(())
        }
    }
}

async fn spool_messages<W>(
    mut writer: W,
    mut relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = relay_rx.recv().await {
        let line = match serde_json::to_string(&msg) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode relay message: {}", e);
                continue;
            }
        };
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    info!("Relay sink ended");
    Ok(())
}

async fn log_messages(mut relay_rx: mpsc::UnboundedReceiver<RelayMessage>) {
    while let Some(msg) = relay_rx.recv().await {
        info!(
            channel = %msg.channel,
            phone = %msg.phone,
            media = msg.media,
            "relay: {}",
            msg.message
        );
    }
    info!("Relay sink ended");
}
