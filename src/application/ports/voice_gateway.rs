//! Voice Gateway Port - 语音频道与播放器抽象
//!
//! 具体实现基于 songbird，测试中使用内存实现

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::playback::{ChannelId, GuildId, StreamSource, VoiceCapabilities};

/// 语音网关错误
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Guild not available: {0}")]
    GuildUnavailable(GuildId),

    #[error("Channel not available: {0}")]
    ChannelUnavailable(ChannelId),

    #[error("Not connected to a voice channel in guild {0}")]
    NotConnected(GuildId),

    #[error("Failed to join voice channel: {0}")]
    JoinFailed(String),

    #[error("Failed to start playback: {0}")]
    PlaybackFailed(String),

    #[error("Failed to leave voice channel: {0}")]
    LeaveFailed(String),
}

/// 播放器事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// 开始播放
    Started,
    /// 缓冲中
    Buffering,
    /// 播放结束
    Ended,
    /// 播放器报错
    Error(String),
}

/// 播放器事件流，连接销毁后发送端被丢弃
pub type PlayerEvents = mpsc::UnboundedReceiver<PlayerEvent>;

/// Voice Gateway Port
#[async_trait]
pub trait VoiceGatewayPort: Send + Sync {
    /// 查询机器人在指定语音频道内的权限
    async fn capabilities(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceCapabilities, VoiceError>;

    /// 加入语音频道
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceError>;

    /// 在已加入的频道上播放音源，返回该播放器的事件流
    async fn play(&self, guild_id: GuildId, source: StreamSource) -> Result<PlayerEvents, VoiceError>;

    /// 销毁语音连接，返回之前是否处于连接状态
    async fn leave(&self, guild_id: GuildId) -> Result<bool, VoiceError>;

    /// 当前是否持有该 guild 的语音连接
    fn is_connected(&self, guild_id: GuildId) -> bool;
}
