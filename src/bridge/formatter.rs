//! Relay payload formatting.
//!
//! Text relays are prefixed with the author label, media relays are encoded
//! as `<participant>=|=|=<path-or-marker>` descriptors that the Telegram side
//! splits on the separator.

/// Field separator used inside media descriptors.
pub const DESCRIPTOR_SEPARATOR: &str = "=|=|=";

/// Marker that replaces the file path for location messages.
pub const LOCATION_MARKER: &str = "LOCATION";

/// Format a relayed text message.
///
/// Known contacts are labelled `<#name>`, everyone else by participant id.
pub fn format_text(contact_name: Option<&str>, participant: &str, body: &str) -> String {
    match contact_name {
        Some(name) => format!("<#{}>: {}", name, body),
        None => format!("<{}>: {}", participant, body),
    }
}

/// Encode a location as the path slot of a media descriptor.
pub fn location_marker(latitude: &str, longitude: &str) -> String {
    [LOCATION_MARKER, latitude, longitude].join(DESCRIPTOR_SEPARATOR)
}

/// Build a media descriptor from the author and the file path or marker.
pub fn media_descriptor(participant: &str, path_or_marker: &str) -> String {
    format!("{}{}{}", participant, DESCRIPTOR_SEPARATOR, path_or_marker)
}
