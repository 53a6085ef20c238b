//! Protocol collaborator adapter.
//!
//! The WhatsApp protocol stack itself lives outside this crate; it exchanges
//! JSON lines with the bridge:
//! - `wire`: line format and decoding into typed events
//! - `feed`: event reader and command writer tasks

pub mod feed;
pub mod wire;

pub use feed::{run_command_writer, run_event_feed};
