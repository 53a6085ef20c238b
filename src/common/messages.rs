//! Canonical outbound message types.
//!
//! `ProtocolCommand` flows down to the WhatsApp protocol collaborator,
//! `RelayMessage` flows out to the Telegram side of the bridge.

use serde::Serialize;

/// Command submitted to the protocol collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ProtocolCommand {
    /// Outgoing receipt for an inbound message (`send_receipt`).
    Receipt {
        id: String,
        to: String,
        #[serde(rename = "type")]
        kind: String,
        participant: Option<String>,
    },
    /// Acknowledgement of an inbound receipt (`send_ack`).
    Ack {
        id: String,
        class: String,
        #[serde(rename = "type")]
        kind: String,
        from: String,
    },
    /// Plain text message (`send_text`).
    Text { to: String, body: String },
}

/// Payload handed to the companion (Telegram) channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayMessage {
    /// Name of the relay channel the message was emitted on.
    pub channel: String,
    /// Conversation id the message originated from.
    pub phone: String,
    /// Formatted text, or a media descriptor when `media` is set.
    pub message: String,
    pub media: bool,
}
