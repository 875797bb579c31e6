//! Discord Layer - 网关事件接入

mod handler;

pub use handler::{BotServices, DiscordHandler};
