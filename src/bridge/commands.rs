//! WhatsApp-side slash commands (/link, /add, /me, /bridgeOn, /bridgeOff).
//!
//! Commands are parsed from text bodies and executed against the store. The
//! interpreter never sends anything itself; it returns the replies for the
//! dispatcher to deliver, or signals that the text should be relayed.

use tracing::{debug, info};

use crate::common::error::StoreResult;
use crate::store::BridgeStore;

pub const LINK_INSTRUCTIONS: &str =
    "Please send the above message in the Telegram group that you would like to bridge!";
pub const ADD_SYNTAX: &str = "Syntax: /add <name>";
pub const CONTACT_ADDED: &str = "name added. Pleae verify with ```/me```";
pub const CONTACT_REPLACED: &str =
    "name already existed. name removed and added. Pleae verify with ```/me```";
pub const ME_UNKNOWN: &str = "Please send ```/add NAME``` to add you to my contacts.";
pub const NOT_BRIDGED: &str =
    "This group is not bridged to anywhere. Use ```/link``` to start bridging.";
pub const BRIDGE_ON: &str = "Bridge has been turned on!";
pub const BRIDGE_OFF: &str = "Bridge has been turned off. Use ```/bridgeOn``` to turn it back on.";

/// A recognised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/getID` or `/link`
    Link,
    /// `/add <name>`; the name may be empty.
    Add(String),
    /// `/me`
    Me,
    /// `/bridgeOn`
    BridgeOn,
    /// `/bridgeOff`
    BridgeOff,
}

impl Command {
    /// Parse a text body. Checks run in a fixed precedence order.
    pub fn parse(body: &str) -> Option<Self> {
        if body == "/getID" || body == "/link" {
            Some(Self::Link)
        } else if body.starts_with("/add") {
            let name: String = body.chars().skip(5).collect();
            Some(Self::Add(name.trim().to_string()))
        } else if body == "/me" {
            Some(Self::Me)
        } else if body == "/bridgeOn" {
            Some(Self::BridgeOn)
        } else if body == "/bridgeOff" {
            Some(Self::BridgeOff)
        } else {
            None
        }
    }

    /// Commands that only make sense in a 1:1 chat with the author.
    pub fn is_identity_scoped(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Me)
    }
}

/// Result of running the interpreter over a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The message was consumed; send these replies to the sender in order.
    Handled(Vec<String>),
    /// Not a command (or not applicable here); continue with the relay.
    Relay,
}

/// Who sent the text and what we know about them.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub sender: &'a str,
    pub participant: &'a str,
    pub contact_name: Option<&'a str>,
}

impl CommandContext<'_> {
    fn is_direct(&self) -> bool {
        self.participant == self.sender
    }
}

/// Interpret a text body, applying any state change it requests.
pub fn interpret(
    store: &dyn BridgeStore,
    body: &str,
    ctx: CommandContext<'_>,
) -> StoreResult<CommandOutcome> {
    let Some(command) = Command::parse(body) else {
        return Ok(CommandOutcome::Relay);
    };

    if command.is_identity_scoped() && !ctx.is_direct() {
        debug!(
            "ignoring {:?} from participant {} in {}",
            command, ctx.participant, ctx.sender
        );
        return Ok(CommandOutcome::Relay);
    }

    debug!("command {:?} from {}", command, ctx.sender);

    let replies = match command {
        Command::Link => vec![format!("/link {}", ctx.sender), LINK_INSTRUCTIONS.to_string()],
        Command::Add(name) => vec![add_contact(store, &name, ctx)?],
        Command::Me => vec![match ctx.contact_name {
            Some(name) => format!(
                "I have saved your name as {}. You can edit your name in my contacts by sending ```/add NAME```!",
                name
            ),
            None => ME_UNKNOWN.to_string(),
        }],
        Command::BridgeOn => vec![toggle(store, ctx.sender, true)?],
        Command::BridgeOff => vec![toggle(store, ctx.sender, false)?],
    };

    Ok(CommandOutcome::Handled(replies))
}

fn add_contact(store: &dyn BridgeStore, name: &str, ctx: CommandContext<'_>) -> StoreResult<String> {
    if name.is_empty() {
        return Ok(ADD_SYNTAX.to_string());
    }

    match ctx.contact_name {
        Some(old) => {
            store.replace_contact(old, name, ctx.sender)?;
            info!("contact {} renamed {} -> {}", ctx.sender, old, name);
            Ok(CONTACT_REPLACED.to_string())
        }
        None => {
            store.add_contact(name, ctx.sender)?;
            info!("contact {} saved as {}", ctx.sender, name);
            Ok(CONTACT_ADDED.to_string())
        }
    }
}

fn toggle(store: &dyn BridgeStore, sender: &str, enable: bool) -> StoreResult<String> {
    let reply = match store.toggle_bridge(sender, enable)? {
        None => NOT_BRIDGED,
        Some(_) if enable => BRIDGE_ON,
        Some(_) => BRIDGE_OFF,
    };
    info!("bridge toggle {} for {}: {}", enable, sender, reply);
    Ok(reply.to_string())
}
