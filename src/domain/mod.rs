//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Catalog Context: 曲目元数据与访问凭证
//! - Playback Context: 语音会话与播放状态机

pub mod catalog;
pub mod playback;
