#![allow(dead_code)]

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use chatmux_core::channel::{
    ChannelConfiguration, ChannelFormatSection, ChatChannel, ChatMessage,
};
use chatmux_core::placeholder::PlaceholderResolver;
use chatmux_core::player::ChatPlayer;

/// In-memory player session with a recording delivery sink.
pub struct TestPlayer {
    name: String,
    permissions: Vec<String>,
    active_channel: Mutex<Option<String>>,
    active_channels: Mutex<Vec<String>>,
    messages: Mutex<Vec<(ChatMessage, ThreadId)>>,
    notify: Mutex<Option<Sender<()>>>,
}

impl TestPlayer {
    pub fn new(name: &str) -> Arc<TestPlayer> {
        Self::with_permissions(name, &[])
    }

    pub fn with_permissions(name: &str, permissions: &[&str]) -> Arc<TestPlayer> {
        Arc::new(TestPlayer {
            name: name.to_owned(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            active_channel: Mutex::new(None),
            active_channels: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            notify: Mutex::new(None),
        })
    }

    /// Makes every delivery also signal `tx`.
    pub fn notify_on_delivery(&self, tx: Sender<()>) {
        *self.notify.lock().unwrap() = Some(tx);
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    /// Visible text of every delivered message, formatting ignored.
    pub fn plain_messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.body.plain_text())
            .collect()
    }

    /// The thread each delivery arrived on.
    pub fn delivery_threads(&self) -> Vec<ThreadId> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, thread)| *thread)
            .collect()
    }
}

impl ChatPlayer for TestPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, node: &str) -> bool {
        self.permissions.iter().any(|p| p == node)
    }

    fn send_message(&self, message: ChatMessage) {
        self.messages
            .lock()
            .unwrap()
            .push((message, thread::current().id()));
        if let Some(tx) = &*self.notify.lock().unwrap() {
            let _ = tx.send(());
        }
    }

    fn active_channel(&self) -> Option<String> {
        self.active_channel.lock().unwrap().clone()
    }

    fn set_active_channel(&self, key: &str) {
        *self.active_channel.lock().unwrap() = Some(key.to_owned());
    }

    fn active_channels(&self) -> Vec<String> {
        self.active_channels.lock().unwrap().clone()
    }

    fn set_active_channels(&self, keys: Vec<String>) {
        *self.active_channels.lock().unwrap() = keys;
    }
}

/// Replaces `%rank%` based on the sending player's permissions.
pub struct RankResolver;

impl PlaceholderResolver for RankResolver {
    fn resolve(&self, player: &dyn ChatPlayer, text: &str) -> String {
        let rank = if player.has_permission("rank.mod") {
            "MOD"
        } else {
            "MEMBER"
        };
        text.replace("%rank%", rank)
    }
}

pub fn section(text: &str) -> ChannelFormatSection {
    ChannelFormatSection {
        text: text.to_owned(),
        ..Default::default()
    }
}

pub fn configuration(display_name: &str, priority: i32) -> ChannelConfiguration {
    ChannelConfiguration {
        display_name: display_name.to_owned(),
        priority,
        permission: String::new(),
        ping_format: None,
        format_sections: vec![section("%message%")],
    }
}

pub fn channel(key: &str, priority: i32) -> ChatChannel {
    ChatChannel::new(key, configuration(key, priority))
}

pub fn as_player(player: &Arc<TestPlayer>) -> Arc<dyn ChatPlayer> {
    player.clone()
}
