//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod discord;
pub mod memory;
pub mod worker;

pub use discord::{BotServices, DiscordHandler};
pub use memory::InMemorySessionRegistry;
pub use worker::{SessionWorker, SessionWorkerConfig};
