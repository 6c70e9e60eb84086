use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, value};

use crate::channel::{ChannelConfiguration, ChannelRegistry, ChatChannel};

/// A `[[channels]]` entry: a channel key plus its configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDef {
    pub key: String,
    #[serde(flatten)]
    pub configuration: ChannelConfiguration,
}

trait ConfigSerializeDefault {
    fn fix_config(self, name: &str, doc: &mut DocumentMut);
}

macro_rules! impl_simple_default {
    ( $( $type:ty ),* ) => {
        $(
            impl ConfigSerializeDefault for $type {
                fn fix_config(self, name: &str, doc: &mut DocumentMut) {
                    doc.entry(name).or_insert_with(|| value(self));
                }
            }
        )*
    }
}

impl_simple_default!(String, i64, bool);

impl<T> ConfigSerializeDefault for Vec<T> {
    fn fix_config(self, _: &str, _: &mut DocumentMut) {
        assert!(self.is_empty(), "non-empty `Vec` as default is unimplemented");
    }
}

macro_rules! gen_config {
    (
        $( $name:ident: $type:ty = $default:expr),*
    ) => {
        #[derive(Debug, Serialize, Deserialize)]
        pub struct ChatConfig {
            $(
                #[serde(default)]
                pub $name: $type,
            )*
        }

        impl ChatConfig {
            /// Loads `config_file`, filling in (and writing back) defaults for
            /// any missing flat settings. A missing file is treated as empty.
            pub fn load(config_file: &str) -> Result<ChatConfig> {
                let str = fs::read_to_string(config_file).unwrap_or_default();
                let mut doc = str
                    .parse::<DocumentMut>()
                    .with_context(|| format!("invalid toml in {config_file}"))?;

                $(
                    <$type as ConfigSerializeDefault>::fix_config($default, stringify!($name), &mut doc);
                )*

                let patched = doc.to_string();
                if str != patched {
                    let mut file = fs::OpenOptions::new()
                        .create(true)
                        .write(true)
                        .truncate(true)
                        .open(config_file)
                        .with_context(|| format!("failed to write {config_file}"))?;
                    write!(file, "{}", patched)?;
                }

                toml::from_str(&patched).with_context(|| format!("failed to parse {config_file}"))
            }
        }
    };
}

gen_config! {
    global_channel: String = "global".to_string(),
    log_chat: bool = true,
    channels: Vec<ChannelDef> = Vec::new()
}

impl ChatConfig {
    /// Builds the channel registry from the configured channels. The global
    /// channel is synthesized with a default format if no `[[channels]]`
    /// entry defines it.
    pub fn build_registry(&self) -> ChannelRegistry {
        let mut registry = ChannelRegistry::new(&self.global_channel);
        for def in &self.channels {
            registry.register(ChatChannel::new(&def.key, def.configuration.clone()));
        }
        registry
    }
}
