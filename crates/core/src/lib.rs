#![deny(rust_2018_idioms)]

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod placeholder;
pub mod player;
