//! Cadenza - Discord 音乐机器人
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Catalog Context: 曲目元数据与曲库凭证租约
//! - Playback Context: 每个 guild 的语音会话状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Catalog, StreamResolver, VoiceGateway, Chat, SessionRegistry）
//! - Commands: 聊天命令解析、处理器与分发
//!
//! 基础设施层 (infrastructure/):
//! - Discord: serenity 事件入口
//! - Memory: SessionRegistry 内存实现
//! - Worker: SessionWorker 驱动会话状态机与重试
//! - Adapters: Spotify, yt-dlp, songbird, serenity 回复, 测试用 fake

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
