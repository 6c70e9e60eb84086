//! Message dispatch: resolve the destination channel, render one output per
//! subscriber, deliver.

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, ThreadId};

use chatmux_text::{ClickEvent, HoverEvent, TextComponent, strip_color};
use regex::{NoExpand, Regex};
use tracing::{debug, info, warn};

use crate::channel::{ChannelRegistry, ChatChannel, ChatMessage};
use crate::placeholder::PlaceholderResolver;
use crate::player::ChatPlayer;

struct DispatchJob {
    forced: Option<String>,
    sender: Arc<dyn ChatPlayer>,
    text: String,
}

/// Entry point for routing chat messages.
///
/// The thread constructing the handler is recorded as the host's main
/// thread: `handle_message` called there hands the work to a background
/// worker and returns immediately; called from any other thread it runs the
/// dispatch synchronously before returning.
pub struct ChatHandler {
    registry: Arc<ChannelRegistry>,
    placeholders: Arc<dyn PlaceholderResolver>,
    worker: Sender<DispatchJob>,
    main_thread: ThreadId,
    log_chat: bool,
}

impl ChatHandler {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        placeholders: Arc<dyn PlaceholderResolver>,
        log_chat: bool,
    ) -> ChatHandler {
        let (worker, jobs) = mpsc::channel::<DispatchJob>();
        let worker_registry = registry.clone();
        let worker_placeholders = placeholders.clone();
        thread::Builder::new()
            .name("chat-dispatch".to_owned())
            .spawn(move || {
                while let Ok(job) = jobs.recv() {
                    dispatch_message(
                        &worker_registry,
                        worker_placeholders.as_ref(),
                        job.forced.as_deref(),
                        job.sender,
                        &job.text,
                        log_chat,
                    );
                }
            })
            .unwrap();
        ChatHandler {
            registry,
            placeholders,
            worker,
            main_thread: thread::current().id(),
            log_chat,
        }
    }

    /// Routes `text` from `sender`, optionally forcing the destination
    /// channel. Fire and forget: nothing is reported back and a send with no
    /// valid destination is silently dropped.
    pub fn handle_message(&self, forced: Option<&str>, sender: Arc<dyn ChatPlayer>, text: &str) {
        if thread::current().id() == self.main_thread {
            let job = DispatchJob {
                forced: forced.map(str::to_owned),
                sender,
                text: text.to_owned(),
            };
            if self.worker.send(job).is_err() {
                warn!("chat dispatch worker is gone, dropping message");
            }
        } else {
            dispatch_message(
                &self.registry,
                self.placeholders.as_ref(),
                forced,
                sender,
                text,
                self.log_chat,
            );
        }
    }
}

/// Runs one resolve, format and deliver pass on the calling thread.
pub fn dispatch_message(
    registry: &ChannelRegistry,
    placeholders: &dyn PlaceholderResolver,
    forced: Option<&str>,
    sender: Arc<dyn ChatPlayer>,
    text: &str,
    log_chat: bool,
) {
    let Some(channel) = resolve_channel(registry, forced, &sender) else {
        debug!("{}: no destination channel, dropping message", sender.name());
        return;
    };
    if !channel.is_valid(sender.as_ref()) {
        debug!(
            "{}: channel `{}` is not valid for them, dropping message",
            sender.name(),
            channel.key()
        );
        return;
    }
    if log_chat {
        info!("[{}] <{}> {}", channel.key(), sender.name(), text);
    }
    for receiver in channel.subscribers() {
        let body = format_message(channel, placeholders, sender.as_ref(), receiver.as_ref(), text);
        receiver.send_message(ChatMessage {
            channel: channel.key().to_owned(),
            sender: sender.name().to_owned(),
            body,
        });
    }
}

fn resolve_channel<'a>(
    registry: &'a ChannelRegistry,
    forced: Option<&str>,
    sender: &Arc<dyn ChatPlayer>,
) -> Option<&'a ChatChannel> {
    if let Some(key) = forced {
        return registry.get(key);
    }
    registry.update_memberships(sender);
    if let Some(active_key) = sender.active_channel() {
        if let Some(active) = registry.get(&active_key) {
            if !active.is_valid(sender.as_ref()) {
                // An invalid cached active channel is still selected here; the
                // validity check in `dispatch_message` then drops the send.
                return Some(active);
            }
        }
    }
    let mut channels: Vec<&ChatChannel> = sender
        .active_channels()
        .iter()
        .filter_map(|key| registry.get(key))
        .collect();
    if channels.is_empty() {
        return Some(registry.global_channel());
    }
    // Stable sort: priority ties keep subscription order
    channels.sort_by_key(|channel| Reverse(channel.configuration().priority));
    let picked = channels[0];
    sender.set_active_channel(picked.key());
    Some(picked)
}

fn format_message(
    channel: &ChatChannel,
    placeholders: &dyn PlaceholderResolver,
    sender: &dyn ChatPlayer,
    receiver: &dyn ChatPlayer,
    raw: &str,
) -> TextComponent {
    let configuration = channel.configuration();
    let mut root = TextComponent::default();
    let stripped = strip_color(raw);
    let sender_mentioned =
        configuration.ping_format.is_some() && raw.contains(&format!("@{}", sender.name()));
    for section in &configuration.format_sections {
        if !section.permission.is_empty() && !sender.has_permission(&section.permission) {
            continue;
        }
        let text_format = handle_text(channel, placeholders, sender, &section.text);
        let mut message_text = stripped.clone();
        if sender_mentioned {
            if let Some(ping_format) = &configuration.ping_format {
                message_text = replace_ignore_case(
                    &message_text,
                    &format!("@{}", receiver.name()),
                    &ping_format.replace("%name%", receiver.name()),
                );
            }
        }
        let body = text_format.replace("%message%", &message_text);
        root.extra.extend(TextComponent::from_legacy_text(&body));
        if !section.hover_text.is_empty() {
            let hover = handle_text(channel, placeholders, sender, &section.hover_text);
            root.hover_event = Some(HoverEvent::show_text(TextComponent::from_legacy_text(&hover)));
        }
        if let Some(action) = section.click_action {
            if !section.click_text.is_empty() {
                // The click payload carries the section's raw hover template
                root.click_event = Some(ClickEvent::new(action, section.hover_text.clone()));
            }
        }
    }
    root
}

fn handle_text(
    channel: &ChatChannel,
    placeholders: &dyn PlaceholderResolver,
    sender: &dyn ChatPlayer,
    format: &str,
) -> String {
    placeholders
        .resolve(sender, format)
        .replace("%sender%", sender.name())
        .replace("%channel%", &channel.configuration().display_name)
        .replace("%channel_id%", &channel.key().to_lowercase())
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(needle))).unwrap();
    pattern
        .replace_all(haystack, NoExpand(replacement))
        .into_owned()
}
