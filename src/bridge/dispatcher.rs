//! Inbound event dispatcher.
//!
//! Entry point for everything the protocol collaborator delivers. Each event
//! is handled to completion before the next one; failures are logged here and
//! never propagate back into the protocol layer.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::bridge::channels::DispatchChannels;
use crate::bridge::commands::{self, CommandContext, CommandOutcome};
use crate::bridge::formatter;
use crate::bridge::media::MediaStore;
use crate::common::error::Result;
use crate::common::types::recipient_address;
use crate::common::{
    InboundEvent, MediaPayload, MessageContent, MessageEvent, ProtocolCommand, ReceiptEvent,
    RelayMessage,
};
use crate::store::BridgeStore;

/// Routes inbound WhatsApp events to commands or the Telegram relay.
pub struct Dispatcher {
    store: Arc<dyn BridgeStore>,
    media: MediaStore,
    channels: DispatchChannels,
    relay_channel: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn BridgeStore>,
        media: MediaStore,
        channels: DispatchChannels,
        relay_channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            media,
            channels,
            relay_channel: relay_channel.into(),
        }
    }

    /// Handle any inbound event.
    pub async fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::Message(message) => self.on_message(&message).await,
            InboundEvent::Receipt(receipt) => self.on_receipt(&receipt),
        }
    }

    /// Acknowledge a receipt back to the protocol layer.
    pub fn on_receipt(&self, receipt: &ReceiptEvent) {
        debug!("ACK receipt {} from {}", receipt.id, receipt.from);

        self.send_protocol(ProtocolCommand::Ack {
            id: receipt.id.clone(),
            class: "receipt".to_string(),
            kind: receipt.kind.clone(),
            from: receipt.from.clone(),
        });
    }

    /// Handle an inbound chat message. Never fails; errors are logged.
    pub async fn on_message(&self, message: &MessageEvent) {
        if let Err(e) = self.handle_message(message).await {
            error!(
                "Failed to handle message {} from {}: {}",
                message.id, message.from_full, e
            );
        }
    }

    async fn handle_message(&self, message: &MessageEvent) -> Result<()> {
        let sender = message.sender();
        let participant = message.participant_id();

        debug!("received message from {}", message.from_full);

        self.send_protocol(ProtocolCommand::Receipt {
            id: message.id.clone(),
            to: message.from_full.clone(),
            kind: "read".to_string(),
            participant: message.participant.clone(),
        });

        if self.store.is_blacklisted(sender)? {
            debug!("phone is blacklisted: {}", sender);
            return Ok(());
        }

        let contact_name = self.store.get_contact(participant)?;

        match &message.content {
            MessageContent::Text { body } => {
                let ctx = CommandContext {
                    sender,
                    participant,
                    contact_name: contact_name.as_deref(),
                };

                match commands::interpret(self.store.as_ref(), body, ctx)? {
                    CommandOutcome::Handled(replies) => {
                        for reply in replies {
                            self.send_text(sender, reply);
                        }
                    }
                    CommandOutcome::Relay => {
                        if !self.store.is_bridge_enabled(sender)? {
                            debug!("bridge disabled for {}, not relaying", sender);
                            return Ok(());
                        }
                        let text =
                            formatter::format_text(contact_name.as_deref(), participant, body);
                        self.relay(sender, text, false);
                    }
                }
            }
            MessageContent::Media(media) => self.relay_media(sender, participant, media).await?,
        }

        Ok(())
    }

    async fn relay_media(&self, sender: &str, participant: &str, media: &MediaPayload) -> Result<()> {
        self.media.ensure_dir().await?;

        let extension = media.attachment().map(|a| a.extension.as_str()).unwrap_or("");
        let path = self.media.unique_path(sender, extension);
        let mut slot = path.display().to_string();

        match media {
            MediaPayload::Image(attachment)
            | MediaPayload::Video(attachment)
            | MediaPayload::Audio(attachment)
            | MediaPayload::Document(attachment) => {
                info!(
                    "Echoing {} {} to {}",
                    media.kind(),
                    attachment.url.as_deref().unwrap_or("<no url>"),
                    slot
                );
                self.media.write(&path, &attachment.data).await?;
            }
            MediaPayload::Location {
                latitude,
                longitude,
            } => {
                info!("Echoing location ({}, {}) to {}", latitude, longitude, sender);
                slot = formatter::location_marker(latitude, longitude);
            }
            MediaPayload::Vcard { name, card_data } => {
                info!("Echoing vcard ({}, {}) to {}", name, card_data, sender);
            }
        }

        let descriptor = formatter::media_descriptor(participant, &slot);
        self.relay(sender, descriptor, true);
        Ok(())
    }

    fn relay(&self, sender: &str, message: String, media: bool) {
        info!("relaying message to Telegram");

        let relay = RelayMessage {
            channel: self.relay_channel.clone(),
            phone: sender.to_string(),
            message,
            media,
        };
        if let Err(e) = self.channels.relay_tx.send(relay) {
            error!("Failed to queue relay message: {}", e);
        }
    }

    /// Send a text message to a bare phone or group id.
    pub fn send_text(&self, phone: &str, body: String) {
        if phone.is_empty() {
            debug!("no phone provided");
            return;
        }

        self.send_protocol(ProtocolCommand::Text {
            to: recipient_address(phone),
            body,
        });
    }

    fn send_protocol(&self, command: ProtocolCommand) {
        if let Err(e) = self.channels.protocol_tx.send(command) {
            debug!("Protocol channel closed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::channels::{ChannelBundle, SinkChannels};
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::common::error::{StoreError, StoreResult};
    use crate::common::Attachment;
    use crate::config::{LinkConfig, StoreConfig};
    use crate::store::{self, MemoryStore};

    /// Memory store whose contact lookups fail while `failing` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    impl BridgeStore for FlakyStore {
        fn is_blacklisted(&self, id: &str) -> StoreResult<bool> {
            self.inner.is_blacklisted(id)
        }

        fn get_contact(&self, id: &str) -> StoreResult<Option<String>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Poisoned);
            }
            self.inner.get_contact(id)
        }

        fn add_contact(&self, name: &str, id: &str) -> StoreResult<()> {
            self.inner.add_contact(name, id)
        }

        fn remove_contact(&self, name: &str) -> StoreResult<()> {
            self.inner.remove_contact(name)
        }

        fn is_bridge_enabled(&self, id: &str) -> StoreResult<bool> {
            self.inner.is_bridge_enabled(id)
        }

        fn toggle_bridge(&self, id: &str, enable: bool) -> StoreResult<Option<bool>> {
            self.inner.toggle_bridge(id, enable)
        }

        fn link_destination(&self, id: &str) -> StoreResult<Option<String>> {
            self.inner.link_destination(id)
        }

        fn link_chat(&self, id: &str, destination: &str) -> StoreResult<()> {
            self.inner.link_chat(id, destination)
        }

        fn add_to_blacklist(&self, id: &str) -> StoreResult<()> {
            self.inner.add_to_blacklist(id)
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        store: Arc<MemoryStore>,
        sinks: SinkChannels,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(MemoryStore::new());
            let bundle = ChannelBundle::new();
            let dispatcher = Dispatcher::new(
                store.clone(),
                MediaStore::new(dir.path().join("DOWNLOADS")),
                bundle.dispatch,
                "wabot",
            );
            Self {
                dispatcher,
                store,
                sinks: bundle.sinks,
                _dir: dir,
            }
        }

        fn protocol(&mut self) -> Vec<ProtocolCommand> {
            let mut out = Vec::new();
            while let Ok(cmd) = self.sinks.protocol_rx.try_recv() {
                out.push(cmd);
            }
            out
        }

        /// Protocol text messages, skipping the read receipts.
        fn texts(&mut self) -> Vec<(String, String)> {
            self.protocol()
                .into_iter()
                .filter_map(|cmd| match cmd {
                    ProtocolCommand::Text { to, body } => Some((to, body)),
                    _ => None,
                })
                .collect()
        }

        fn relays(&mut self) -> Vec<RelayMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.sinks.relay_rx.try_recv() {
                out.push(msg);
            }
            out
        }

        fn download_dir(&self) -> std::path::PathBuf {
            self.dispatcher.media.download_dir().to_path_buf()
        }
    }

    fn message(from: &str, participant: Option<&str>, content: MessageContent) -> MessageEvent {
        MessageEvent {
            id: "MSG1".to_string(),
            from: from.to_string(),
            from_full: recipient_address(from),
            participant: participant.map(str::to_string),
            content,
        }
    }

    fn text(from: &str, participant: Option<&str>, body: &str) -> MessageEvent {
        message(
            from,
            participant,
            MessageContent::Text {
                body: body.to_string(),
            },
        )
    }

    fn attachment(extension: &str, data: &[u8]) -> Attachment {
        Attachment {
            url: Some("https://mmg.whatsapp.net/x".to_string()),
            extension: extension.to_string(),
            data: data.to_vec(),
        }
    }

    fn image(from: &str, participant: Option<&str>, data: &[u8]) -> MessageEvent {
        message(
            from,
            participant,
            MessageContent::Media(MediaPayload::Image(attachment(".jpg", data))),
        )
    }

    #[tokio::test]
    async fn test_read_receipt_sent_first() {
        let mut h = Harness::new();
        h.dispatcher
            .on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "hi"))
            .await;

        let protocol = h.protocol();
        assert_eq!(
            protocol[0],
            ProtocolCommand::Receipt {
                id: "MSG1".to_string(),
                to: "4915-1600@g.us".to_string(),
                kind: "read".to_string(),
                participant: Some("4917@s.whatsapp.net".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_receipt_is_acknowledged() {
        let mut h = Harness::new();
        h.dispatcher
            .dispatch(InboundEvent::Receipt(ReceiptEvent {
                id: "R1".to_string(),
                from: "4915@s.whatsapp.net".to_string(),
                kind: "read".to_string(),
            }))
            .await;

        assert_eq!(
            h.protocol(),
            vec![ProtocolCommand::Ack {
                id: "R1".to_string(),
                class: "receipt".to_string(),
                kind: "read".to_string(),
                from: "4915@s.whatsapp.net".to_string(),
            }]
        );
        assert!(h.relays().is_empty());
    }

    #[tokio::test]
    async fn test_blacklisted_sender_is_ignored() {
        let mut h = Harness::new();
        h.store.add_to_blacklist("4915").unwrap();
        h.store.link_chat("4915", "-100123").unwrap();

        for body in ["/getID", "/add Alice", "/me", "/bridgeOn", "hello"] {
            h.dispatcher.on_message(&text("4915", None, body)).await;
        }
        h.dispatcher.on_message(&image("4915", None, b"jpeg")).await;

        assert!(h.texts().is_empty());
        assert!(h.relays().is_empty());
        assert_eq!(h.store.get_contact("4915").unwrap(), None);
        assert!(!h.download_dir().exists());
    }

    #[tokio::test]
    async fn test_get_id_sends_two_messages() {
        let mut h = Harness::new();
        h.dispatcher.on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "/getID")).await;

        let texts = h.texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(
            texts[0],
            ("4915-1600@g.us".to_string(), "/link 4915-1600".to_string())
        );
        assert_eq!(texts[1].1, commands::LINK_INSTRUCTIONS);
        assert!(h.relays().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_relay_uses_contact_name() {
        let mut h = Harness::new();
        h.store.link_chat("4915", "-100123").unwrap();

        h.dispatcher.on_message(&text("4915", None, "/add Alice")).await;
        let texts = h.texts();
        assert_eq!(texts, vec![("4915@s.whatsapp.net".to_string(), commands::CONTACT_ADDED.to_string())]);
        assert!(h.relays().is_empty());

        h.dispatcher.on_message(&text("4915", None, "hello")).await;
        assert_eq!(
            h.relays(),
            vec![RelayMessage {
                channel: "wabot".to_string(),
                phone: "4915".to_string(),
                message: "<#Alice>: hello".to_string(),
                media: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_add_replaces_previous_name() {
        let mut h = Harness::new();
        h.store.add_contact("Alice", "4915").unwrap();

        h.dispatcher.on_message(&text("4915", None, "/add Alicia")).await;

        assert!(h.texts()[0].1.contains("already existed"));
        assert_eq!(h.store.get_contact("4915").unwrap().as_deref(), Some("Alicia"));
    }

    #[tokio::test]
    async fn test_relay_without_contact_uses_participant() {
        let mut h = Harness::new();
        h.store.link_chat("4915-1600", "-100123").unwrap();

        h.dispatcher
            .on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "hi all"))
            .await;

        let relays = h.relays();
        assert_eq!(relays.len(), 1);
        assert_eq!(relays[0].phone, "4915-1600");
        assert_eq!(relays[0].message, "<4917>: hi all");
        assert!(!relays[0].media);
    }

    #[tokio::test]
    async fn test_group_participant_contact_name() {
        let mut h = Harness::new();
        h.store.link_chat("4915-1600", "-100123").unwrap();
        h.store.add_contact("Bob", "4917").unwrap();

        h.dispatcher
            .on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "hi"))
            .await;

        assert_eq!(h.relays()[0].message, "<#Bob>: hi");
    }

    #[tokio::test]
    async fn test_text_not_relayed_when_bridge_disabled() {
        let mut h = Harness::new();

        // Unlinked
        h.dispatcher.on_message(&text("4915-1600", None, "hello")).await;
        assert!(h.relays().is_empty());

        // Linked but off
        h.store.link_chat("4915-1600", "-100123").unwrap();
        h.dispatcher.on_message(&text("4915-1600", None, "/bridgeOff")).await;
        h.dispatcher.on_message(&text("4915-1600", None, "hello")).await;
        assert!(h.relays().is_empty());

        h.dispatcher.on_message(&text("4915-1600", None, "/bridgeOn")).await;
        h.dispatcher.on_message(&text("4915-1600", None, "hello")).await;
        assert_eq!(h.relays().len(), 1);
    }

    #[tokio::test]
    async fn test_bridge_on_unlinked_replies_not_bridged() {
        let mut h = Harness::new();
        h.dispatcher.on_message(&text("4915-1600", None, "/bridgeOn")).await;

        let texts = h.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].1.contains("not bridged"));
    }

    #[tokio::test]
    async fn test_me_in_group_falls_through_to_relay() {
        let mut h = Harness::new();
        h.store.link_chat("4915-1600", "-100123").unwrap();

        h.dispatcher
            .on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "/me"))
            .await;

        assert!(h.texts().is_empty());
        assert_eq!(h.relays()[0].message, "<4917>: /me");
    }

    #[tokio::test]
    async fn test_image_written_and_relayed() {
        let mut h = Harness::new();
        let bytes = b"\xff\xd8\xff\xe0jpeg-bytes";

        h.dispatcher
            .on_message(&image("4915-1600", Some("4917@s.whatsapp.net"), bytes))
            .await;

        let relays = h.relays();
        assert_eq!(relays.len(), 1);
        assert!(relays[0].media);
        assert_eq!(relays[0].phone, "4915-1600");

        let (participant, path) = relays[0].message.split_once("=|=|=").unwrap();
        assert_eq!(participant, "4917");

        let path = std::path::Path::new(path);
        assert_eq!(path.parent().unwrap(), h.download_dir());
        assert_eq!(std::fs::read(path).unwrap(), bytes);

        let name = path.file_name().unwrap().to_str().unwrap();
        let (hash, token) = name.strip_suffix(".jpg").unwrap().split_once('-').unwrap();
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_other_attachments_written_verbatim() {
        let mut h = Harness::new();
        let cases = [
            (MediaPayload::Video(attachment(".mp4", b"mp4-bytes")), ".mp4", &b"mp4-bytes"[..]),
            (MediaPayload::Audio(attachment(".ogg", b"ogg-bytes")), ".ogg", &b"ogg-bytes"[..]),
            (MediaPayload::Document(attachment(".pdf", b"%PDF-1.4")), ".pdf", &b"%PDF-1.4"[..]),
        ];

        for (payload, extension, bytes) in cases {
            h.dispatcher
                .on_message(&message("4915", None, MessageContent::Media(payload)))
                .await;

            let relays = h.relays();
            assert_eq!(relays.len(), 1);
            assert!(relays[0].media);

            let (participant, path) = relays[0].message.split_once("=|=|=").unwrap();
            assert_eq!(participant, "4915");
            assert!(path.ends_with(extension));
            assert_eq!(std::fs::read(path).unwrap(), bytes);
        }

        assert_eq!(std::fs::read_dir(h.download_dir()).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FlakyStore::default());
        store.link_chat("4915", "-100123").unwrap();
        let ChannelBundle { dispatch, mut sinks, .. } = ChannelBundle::new();
        let dispatcher = Dispatcher::new(
            store.clone(),
            MediaStore::new(dir.path().join("DOWNLOADS")),
            dispatch,
            "wabot",
        );

        store.failing.store(true, Ordering::SeqCst);
        dispatcher.on_message(&text("4915", None, "lost")).await;

        // Receipt goes out before the store is consulted; nothing else does.
        assert!(matches!(
            sinks.protocol_rx.try_recv(),
            Ok(ProtocolCommand::Receipt { .. })
        ));
        assert!(sinks.protocol_rx.try_recv().is_err());
        assert!(sinks.relay_rx.try_recv().is_err());

        store.failing.store(false, Ordering::SeqCst);
        dispatcher.on_message(&text("4915", None, "delivered")).await;
        assert_eq!(sinks.relay_rx.try_recv().unwrap().message, "<4915>: delivered");
    }

    #[tokio::test]
    async fn test_configured_link_enables_bridge_commands() {
        let mut h = Harness::new();
        let config = StoreConfig {
            path: None,
            blacklist: Vec::new(),
            links: vec![LinkConfig {
                wa: "4915-1600".to_string(),
                tg: "-100123".to_string(),
            }],
        };
        store::seed(h.store.as_ref(), &config).unwrap();

        h.dispatcher.on_message(&text("4915-1600", None, "/bridgeOn")).await;
        assert_eq!(
            h.texts(),
            vec![("4915-1600@g.us".to_string(), commands::BRIDGE_ON.to_string())]
        );

        h.dispatcher
            .on_message(&text("4915-1600", Some("4917@s.whatsapp.net"), "hello"))
            .await;
        assert_eq!(h.relays()[0].message, "<4917>: hello");
    }

    #[tokio::test]
    async fn test_media_relayed_even_when_bridge_disabled() {
        let mut h = Harness::new();
        h.dispatcher.on_message(&image("4915", None, b"data")).await;
        assert_eq!(h.relays().len(), 1);
    }

    #[tokio::test]
    async fn test_location_descriptor() {
        let mut h = Harness::new();
        let event = message(
            "4915",
            None,
            MessageContent::Media(MediaPayload::Location {
                latitude: "1.0".to_string(),
                longitude: "2.0".to_string(),
            }),
        );

        h.dispatcher.on_message(&event).await;

        let relays = h.relays();
        assert_eq!(relays[0].message, "4915=|=|=LOCATION=|=|=1.0=|=|=2.0");
        assert!(relays[0].media);
        let entries = std::fs::read_dir(h.download_dir()).unwrap().count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn test_vcard_writes_no_file() {
        let mut h = Harness::new();
        let event = message(
            "4915",
            None,
            MessageContent::Media(MediaPayload::Vcard {
                name: "Alice".to_string(),
                card_data: "BEGIN:VCARD\nEND:VCARD".to_string(),
            }),
        );

        h.dispatcher.on_message(&event).await;

        let relays = h.relays();
        assert_eq!(relays.len(), 1);
        assert!(relays[0].message.starts_with("4915=|=|="));
        assert!(!relays[0].message.contains("VCARD"));
        assert_eq!(std::fs::read_dir(h.download_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_media_write_is_contained() {
        let mut h = Harness::new();
        // A plain file where the download directory should be.
        std::fs::write(h.download_dir(), b"not a directory").unwrap();

        h.dispatcher.on_message(&image("4915", None, b"data")).await;
        assert!(h.relays().is_empty());

        // The dispatcher keeps working for the next event.
        h.store.link_chat("4915", "-100123").unwrap();
        h.dispatcher.on_message(&text("4915", None, "still here")).await;
        assert_eq!(h.relays()[0].message, "<4915>: still here");
    }

    #[tokio::test]
    async fn test_send_text_without_phone_is_skipped() {
        let mut h = Harness::new();
        h.dispatcher.send_text("", "hello".to_string());
        assert!(h.protocol().is_empty());
    }

    #[tokio::test]
    async fn test_closed_relay_channel_does_not_panic() {
        let mut h = Harness::new();
        h.store.link_chat("4915", "-100123").unwrap();
        h.sinks.relay_rx.close();

        h.dispatcher.on_message(&text("4915", None, "hello")).await;
        assert!(h.relays().is_empty());
    }
}
