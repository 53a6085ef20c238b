//! WhatsApp side of the bridge.
//!
//! ## Module Structure
//!
//! - `channels`: Communication channel structures
//! - `commands`: Slash-command parsing and execution
//! - `dispatcher`: Inbound event handling (`Dispatcher`)
//! - `formatter`: Relay text and media descriptor encoding
//! - `media`: Download directory and media files

pub mod channels;
pub mod commands;
pub mod dispatcher;
pub mod formatter;
pub mod media;

pub use channels::{ChannelBundle, SinkChannels};
pub use dispatcher::Dispatcher;
pub use media::MediaStore;
