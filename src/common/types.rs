//! Shared types used across the application.

/// Suffix of an individual WhatsApp address.
pub const USER_SUFFIX: &str = "@s.whatsapp.net";

/// Suffix of a WhatsApp group address.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Strip the protocol suffix from an address, leaving the bare phone/group id.
pub fn bare_id(address: &str) -> &str {
    address
        .strip_suffix(USER_SUFFIX)
        .or_else(|| address.strip_suffix(GROUP_SUFFIX))
        .unwrap_or(address)
}

/// Build the full recipient address for a bare phone or group id.
///
/// Group ids carry a `-` between creator phone and creation timestamp.
pub fn recipient_address(phone: &str) -> String {
    if phone.contains('-') {
        format!("{}{}", phone, GROUP_SUFFIX)
    } else {
        format!("{}{}", phone, USER_SUFFIX)
    }
}

/// Event delivered by the protocol collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(MessageEvent),
    Receipt(ReceiptEvent),
}

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Protocol message id.
    pub id: String,
    /// Conversation id without suffix (individual or group).
    pub from: String,
    /// Conversation address including the protocol suffix.
    pub from_full: String,
    /// Full address of the group author, absent in 1:1 chats.
    pub participant: Option<String>,
    pub content: MessageContent,
}

impl MessageEvent {
    /// Conversation-level sender id.
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Author-level id: the group participant without suffix, or the sender.
    pub fn participant_id(&self) -> &str {
        match self.participant.as_deref() {
            Some(p) if !p.is_empty() => bare_id(p),
            _ => &self.from,
        }
    }
}

/// Body of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text { body: String },
    Media(MediaPayload),
}

/// Media message payload by subtype.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaPayload {
    Image(Attachment),
    Video(Attachment),
    Audio(Attachment),
    Document(Attachment),
    Location { latitude: String, longitude: String },
    Vcard { name: String, card_data: String },
}

impl MediaPayload {
    /// Subtype name as used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::Document(_) => "document",
            Self::Location { .. } => "location",
            Self::Vcard { .. } => "vcard",
        }
    }

    /// The downloadable attachment, for subtypes that carry file bytes.
    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Image(a) | Self::Video(a) | Self::Audio(a) | Self::Document(a) => Some(a),
            Self::Location { .. } | Self::Vcard { .. } => None,
        }
    }
}

/// Downloaded media content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachment {
    /// Source URL reported by the protocol stack (logging only).
    pub url: Option<String>,
    /// File extension including the leading dot, e.g. `.jpg`.
    pub extension: String,
    pub data: Vec<u8>,
}

/// Delivery/read receipt for a message we sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptEvent {
    pub id: String,
    pub from: String,
    /// Receipt kind, e.g. `read` or `delivery`.
    pub kind: String,
}
