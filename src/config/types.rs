//! Configuration type definitions.

use serde::Deserialize;

/// Default relay channel name carried on every relay message.
pub const DEFAULT_RELAY_CHANNEL: &str = "wabot";

/// Default directory for downloaded media.
pub const DEFAULT_DOWNLOAD_DIR: &str = "./DOWNLOADS";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Bridge behaviour settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_relay_channel")]
    pub relay_channel: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relay_channel: default_relay_channel(),
            download_dir: default_download_dir(),
        }
    }
}

/// Contact/bridge store settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file. `None` keeps everything in memory.
    pub path: Option<String>,
    /// Ids added to the blacklist at startup.
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Link records created at startup when missing.
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

/// A WhatsApp conversation bridged to a Telegram chat.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkConfig {
    /// Bare WhatsApp id (`4915` or `4915-1600`).
    pub wa: String,
    /// Telegram chat id.
    pub tg: String,
}

/// Relay sink settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    /// JSON-lines spool file for relay messages. `None` logs them instead.
    pub spool: Option<String>,
}

fn default_relay_channel() -> String {
    DEFAULT_RELAY_CHANNEL.to_string()
}

fn default_download_dir() -> String {
    DEFAULT_DOWNLOAD_DIR.to_string()
}
