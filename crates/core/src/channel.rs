//! Channels, their configuration, and the channel registry.

use std::sync::{Arc, RwLock};

use chatmux_text::{ClickAction, TextComponent};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::ChatPlayer;

/// One permission-gated template unit contributing text, hover and click
/// content to a rendered message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelFormatSection {
    /// Permission the sender needs for the section to render.
    /// Empty = unrestricted.
    #[serde(default)]
    pub permission: String,
    /// Body template. `%message%` is replaced with the stripped chat text.
    pub text: String,
    /// Hover template. Empty = no hover annotation.
    #[serde(default)]
    pub hover_text: String,
    #[serde(default)]
    pub click_action: Option<ClickAction>,
    /// Empty = no click annotation.
    #[serde(default)]
    pub click_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfiguration {
    pub display_name: String,
    /// Channels with a higher priority win automatic selection.
    #[serde(default)]
    pub priority: i32,
    /// Permission required to use the channel. Empty = open to everyone.
    #[serde(default)]
    pub permission: String,
    /// Template used to highlight a subscriber's name when mentioned.
    /// `%name%` is replaced with the subscriber's name.
    #[serde(default)]
    pub ping_format: Option<String>,
    #[serde(default, rename = "format")]
    pub format_sections: Vec<ChannelFormatSection>,
}

/// An immutable chat message as delivered to one receiver.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub channel: String,
    pub sender: String,
    pub body: TextComponent,
}

/// A named routing target with its own formatting rules and subscriber set.
pub struct ChatChannel {
    key: String,
    configuration: ChannelConfiguration,
    subscribers: RwLock<Vec<Arc<dyn ChatPlayer>>>,
}

impl ChatChannel {
    pub fn new(key: impl Into<String>, configuration: ChannelConfiguration) -> ChatChannel {
        ChatChannel {
            key: key.into(),
            configuration,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn configuration(&self) -> &ChannelConfiguration {
        &self.configuration
    }

    /// Whether `player` may use the channel right now. Evaluated per-send,
    /// never cached.
    pub fn is_valid(&self, player: &dyn ChatPlayer) -> bool {
        self.configuration.permission.is_empty()
            || player.has_permission(&self.configuration.permission)
    }

    pub fn subscribe(&self, player: Arc<dyn ChatPlayer>) {
        let mut subscribers = self.subscribers.write().unwrap();
        if !subscribers.iter().any(|s| s.name() == player.name()) {
            subscribers.push(player);
        }
    }

    pub fn unsubscribe(&self, name: &str) {
        self.subscribers
            .write()
            .unwrap()
            .retain(|s| s.name() != name);
    }

    /// Snapshot of the current subscriber set.
    pub fn subscribers(&self) -> Vec<Arc<dyn ChatPlayer>> {
        self.subscribers.read().unwrap().clone()
    }
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("no channel is registered under `{0}`")]
    UnknownChannel(String),
    #[error("`{player}` may not join `{channel}`")]
    NotPermitted { player: String, channel: String },
}

/// All registered channels. Passed explicitly to everything that needs it,
/// there is no process-wide registry.
pub struct ChannelRegistry {
    channels: IndexMap<String, ChatChannel>,
    global_key: String,
}

impl ChannelRegistry {
    /// Creates a registry whose global fallback channel is `global_key`.
    /// The global channel is synthesized up front so it is always present;
    /// registering a channel under the same key replaces its configuration.
    pub fn new(global_key: &str) -> ChannelRegistry {
        let mut registry = ChannelRegistry {
            channels: IndexMap::new(),
            global_key: global_key.to_owned(),
        };
        registry.register(ChatChannel::new(global_key, default_global_configuration()));
        registry
    }

    pub fn register(&mut self, channel: ChatChannel) {
        self.channels.insert(channel.key.clone(), channel);
    }

    pub fn get(&self, key: &str) -> Option<&ChatChannel> {
        self.channels.get(key)
    }

    /// The process-wide fallback channel. Always present, never invalid.
    pub fn global_channel(&self) -> &ChatChannel {
        self.channels
            .get(&self.global_key)
            .expect("global channel is always registered")
    }

    /// Registered channels in registration order.
    pub fn channels(&self) -> impl Iterator<Item = &ChatChannel> {
        self.channels.values()
    }

    /// Subscribes `player` to `key` after a validity check and records the
    /// membership on the player.
    pub fn join(&self, player: &Arc<dyn ChatPlayer>, key: &str) -> Result<(), JoinError> {
        let channel = self
            .get(key)
            .ok_or_else(|| JoinError::UnknownChannel(key.to_owned()))?;
        if !channel.is_valid(player.as_ref()) {
            return Err(JoinError::NotPermitted {
                player: player.name().to_owned(),
                channel: key.to_owned(),
            });
        }
        channel.subscribe(player.clone());
        let mut keys = player.active_channels();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_owned());
            player.set_active_channels(keys);
        }
        Ok(())
    }

    pub fn leave(&self, player: &Arc<dyn ChatPlayer>, key: &str) {
        if let Some(channel) = self.get(key) {
            channel.unsubscribe(player.name());
        }
        let mut keys = player.active_channels();
        keys.retain(|k| k != key);
        player.set_active_channels(keys);
    }

    /// Re-checks all of `player`'s memberships, dropping any channel that is
    /// gone from the registry or no longer valid for them. Never adds
    /// memberships; joining stays an explicit host action.
    pub fn update_memberships(&self, player: &Arc<dyn ChatPlayer>) {
        let mut keys = player.active_channels();
        keys.retain(|key| match self.get(key) {
            Some(channel) if channel.is_valid(player.as_ref()) => true,
            Some(channel) => {
                channel.unsubscribe(player.name());
                false
            }
            None => false,
        });
        player.set_active_channels(keys);
    }
}

fn default_global_configuration() -> ChannelConfiguration {
    ChannelConfiguration {
        display_name: "Global".to_owned(),
        priority: 0,
        permission: String::new(),
        ping_format: None,
        format_sections: vec![ChannelFormatSection {
            text: "&7[%channel%] &f<%sender%> %message%".to_owned(),
            ..Default::default()
        }],
    }
}
