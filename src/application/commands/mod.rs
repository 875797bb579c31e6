//! 应用层 - 命令
//!
//! 聊天命令解析、命令结构体与分发

mod chat_command;
mod dispatcher;
mod playback_commands;

pub mod handlers;

pub use chat_command::{help_text, ChatCommand};
pub use dispatcher::{CommandDispatcher, IncomingMessage};
pub use playback_commands::*;
