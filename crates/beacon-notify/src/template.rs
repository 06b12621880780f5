use beacon_core::events::PresenceEvent;

/// Render a notification template against a presence event.
///
/// Templates use `{displayName}` and `{channelName}` placeholders; unknown
/// placeholders pass through untouched.
pub fn render(template: &str, event: &PresenceEvent) -> String {
    template
        .replace("{displayName}", &event.display_name)
        .replace("{channelName}", &event.channel.name)
}
