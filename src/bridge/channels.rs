//! Bridge channel management.
//!
//! Groups the channels that connect the dispatcher to the protocol writer,
//! the relay sink and the shutdown signal.

use tokio::sync::{mpsc, watch};

use crate::common::{ProtocolCommand, RelayMessage};

/// Channels the dispatcher writes to.
#[derive(Clone)]
pub struct DispatchChannels {
    /// Sender for commands going down to the protocol collaborator.
    pub protocol_tx: mpsc::UnboundedSender<ProtocolCommand>,
    /// Sender for messages going out to the Telegram side.
    pub relay_tx: mpsc::UnboundedSender<RelayMessage>,
}

/// Receivers drained by the writer tasks.
pub struct SinkChannels {
    pub protocol_rx: mpsc::UnboundedReceiver<ProtocolCommand>,
    pub relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
    /// Receiver cloned into each long-running task.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Bundle of all channels created for one bridge instance.
pub struct ChannelBundle {
    pub dispatch: DispatchChannels,
    pub sinks: SinkChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    /// Create a new set of bridge channels.
    pub fn new() -> Self {
        let (protocol_tx, protocol_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            dispatch: DispatchChannels {
                protocol_tx,
                relay_tx,
            },
            sinks: SinkChannels {
                protocol_rx,
                relay_rx,
            },
            control: ControlChannels {
                shutdown_tx,
                shutdown_rx,
            },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
