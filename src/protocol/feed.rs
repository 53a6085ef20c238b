//! Line-based adapter between the protocol collaborator and the dispatcher.
//!
//! Inbound events are read one line at a time and dispatched sequentially;
//! outbound protocol commands are drained from their channel and written as
//! JSON lines.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::bridge::Dispatcher;
use crate::common::ProtocolCommand;
use crate::protocol::wire::{decode_line, encode_command};

/// Read events until EOF or shutdown. Returns the number of dispatched events.
pub async fn run_event_feed<R>(
    reader: R,
    dispatcher: &Dispatcher,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut dispatched = 0;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Shutdown signal received, stopping event feed");
                    break;
                }
                continue;
            }
        };

        let Some(line) = line else {
            info!("Protocol event stream closed");
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(event) => {
                dispatcher.dispatch(event).await;
                dispatched += 1;
            }
            Err(e) => warn!("Dropping malformed protocol event: {}", e),
        }
    }

    Ok(dispatched)
}

/// Write outbound protocol commands until the channel closes.
pub async fn run_command_writer<W>(
    mut writer: W,
    mut protocol_rx: mpsc::UnboundedReceiver<ProtocolCommand>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = protocol_rx.recv().await {
        let line = match encode_command(&command) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode protocol command: {}", e);
                continue;
            }
        };
        debug!("-> protocol: {}", line);

        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    info!("Protocol command writer ended");
    Ok(())
}
