//! JSON-lines wire format spoken with the protocol collaborator.
//!
//! Inbound lines are flat objects tagged by `"event"`; optional fields may be
//! missing and are treated as empty. Decoding turns them into the typed
//! [`InboundEvent`] model.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::common::error::{WireError, WireResult};
use crate::common::types::recipient_address;
use crate::common::{
    Attachment, InboundEvent, MediaPayload, MessageContent, MessageEvent, ProtocolCommand,
    ReceiptEvent,
};

/// Raw inbound line as delivered by the protocol stack.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WireEvent {
    Message(WireMessage),
    Receipt(WireReceipt),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireMessage {
    pub id: String,
    pub from: String,
    pub from_full: String,
    pub participant: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub body: String,
    pub media_type: String,
    /// Base64-encoded media content.
    pub media_bytes: String,
    pub extension: String,
    pub url: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub name: String,
    pub card_data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireReceipt {
    pub id: String,
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Decode one inbound line.
pub fn decode_line(line: &str) -> WireResult<InboundEvent> {
    let event: WireEvent = serde_json::from_str(line)?;
    event.try_into()
}

/// Encode one outbound protocol command (without trailing newline).
pub fn encode_command(command: &ProtocolCommand) -> WireResult<String> {
    Ok(serde_json::to_string(command)?)
}

impl TryFrom<WireEvent> for InboundEvent {
    type Error = WireError;

    fn try_from(event: WireEvent) -> WireResult<Self> {
        match event {
            WireEvent::Message(message) => Ok(Self::Message(message.try_into()?)),
            WireEvent::Receipt(receipt) => Ok(Self::Receipt(ReceiptEvent {
                id: receipt.id,
                from: receipt.from,
                kind: receipt.kind,
            })),
        }
    }
}

impl WireMessage {
    /// Move the media fields out into a typed payload.
    fn take_media(&mut self) -> WireResult<MediaPayload> {
        let media_type = std::mem::take(&mut self.media_type);

        Ok(match media_type.as_str() {
            "image" => MediaPayload::Image(self.take_attachment()?),
            "video" => MediaPayload::Video(self.take_attachment()?),
            "audio" => MediaPayload::Audio(self.take_attachment()?),
            "document" => MediaPayload::Document(self.take_attachment()?),
            "location" => MediaPayload::Location {
                latitude: std::mem::take(&mut self.latitude),
                longitude: std::mem::take(&mut self.longitude),
            },
            "vcard" => MediaPayload::Vcard {
                name: std::mem::take(&mut self.name),
                card_data: std::mem::take(&mut self.card_data),
            },
            other => return Err(WireError::UnknownMediaType(other.to_string())),
        })
    }

    fn take_attachment(&mut self) -> WireResult<Attachment> {
        Ok(Attachment {
            url: self.url.take(),
            extension: std::mem::take(&mut self.extension),
            data: STANDARD.decode(&self.media_bytes)?,
        })
    }
}

impl TryFrom<WireMessage> for MessageEvent {
    type Error = WireError;

    fn try_from(mut wire: WireMessage) -> WireResult<Self> {
        let kind = std::mem::take(&mut wire.kind);
        let content = match kind.as_str() {
            "text" => MessageContent::Text {
                body: std::mem::take(&mut wire.body),
            },
            "media" => MessageContent::Media(wire.take_media()?),
            other => return Err(WireError::UnknownMessageType(other.to_string())),
        };

        let from_full = if wire.from_full.is_empty() {
            recipient_address(&wire.from)
        } else {
            wire.from_full
        };

        Ok(Self {
            id: wire.id,
            from: wire.from,
            from_full,
            participant: wire.participant.filter(|p| !p.is_empty()),
            content,
        })
    }
}
