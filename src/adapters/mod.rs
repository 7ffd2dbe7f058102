// Adapters layer: concrete implementations for external systems (registry HTTP API, Telegram, webhook server).

pub mod registry;
pub mod telegram;
pub mod webhook;
