//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Catalog、StreamResolver、VoiceGateway、Chat、SessionRegistry）
//! - commands: 聊天命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    help_text, ChatCommand, CommandDispatcher, HelpCommand, IncomingMessage, PlayCommand,
    PlayResponse, StopCommand, StopResponse, TestCommand,
    handlers::{HelpHandler, PlayHandler, StopHandler, TestHandler},
};

pub use error::{ApplicationError, LookupSource};

pub use ports::{
    CatalogError, CatalogPort, ChatError, ChatPort, CredentialProviderPort, PlayerEvent,
    PlayerEvents, ResolverError, SessionError, SessionRegistryPort, StreamResolverPort,
    VoiceError, VoiceGatewayPort,
};
