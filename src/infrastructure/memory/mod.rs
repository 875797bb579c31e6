//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionRegistry，管理每个 guild 的语音会话内存状态

mod session_registry;

pub use session_registry::InMemorySessionRegistry;
