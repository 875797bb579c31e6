//! Fake Adapters - 用于测试的内存端口实现
//!
//! 不访问任何外部服务，记录调用以便断言

mod catalog;
mod chat;
mod resolver;
mod voice;

pub use catalog::FakeCatalog;
pub use chat::RecordingChat;
pub use resolver::FakeResolver;
pub use voice::{FakeVoiceGateway, GatewayOp};
