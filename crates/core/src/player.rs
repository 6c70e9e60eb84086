use crate::channel::ChatMessage;

/// The capability surface the router needs from a host player session.
///
/// Implemented once per host; the routing and formatting code never depends
/// on a concrete session type. Channel membership state lives behind this
/// trait so hosts can keep it wherever their session storage is.
pub trait ChatPlayer: Send + Sync {
    /// Display name. Also the token matched for `@name` mentions.
    fn name(&self) -> &str;

    fn has_permission(&self, node: &str) -> bool;

    /// Delivery sink. Best effort: the router neither retries nor reports
    /// failures, and a blocking implementation stalls the whole dispatch.
    fn send_message(&self, message: ChatMessage);

    /// The channel currently selected for this player's outgoing messages.
    fn active_channel(&self) -> Option<String>;

    fn set_active_channel(&self, key: &str);

    /// Keys of all channels the player is subscribed to, in subscription
    /// order.
    fn active_channels(&self) -> Vec<String>;

    fn set_active_channels(&self, keys: Vec<String>);
}
