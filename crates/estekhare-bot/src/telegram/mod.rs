//! Minimal Telegram Bot API client: just the methods and types the bot uses.

mod client;
pub mod types;

pub use client::BotApi;
