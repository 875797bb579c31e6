//! Session Registry Port - 按 guild 管理语音会话
//!
//! 定义会话注册表的抽象接口，具体实现在 infrastructure/memory 层

use thiserror::Error;

use crate::domain::catalog::Track;
use crate::domain::playback::{
    GuildId, PlaybackError, RetryDecision, RetryPolicy, SessionId, SessionState, VoiceSession,
};

/// Session Registry 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active session for guild {0}")]
    NotFound(GuildId),

    #[error("Session already active for guild {0}")]
    AlreadyActive(GuildId),

    #[error("Session {0} was replaced or stopped")]
    Superseded(SessionId),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl SessionError {
    /// 会话已被 stop 移除或被替换，调用方应静默放弃
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SessionError::NotFound(_) | SessionError::Superseded(_))
    }
}

/// Session Registry Port
///
/// 每个 guild 至多一个会话；所有状态迁移都带上会话 ID，
/// 已被移除或替换的会话上的迁移会失败，调用方据此得知自己已被取消
pub trait SessionRegistryPort: Send + Sync {
    /// 登记新会话，该 guild 已有会话时拒绝
    fn try_begin(&self, session: VoiceSession) -> Result<SessionId, SessionError>;

    /// 获取 guild 当前的会话
    fn get(&self, guild_id: GuildId) -> Result<VoiceSession, SessionError>;

    /// 迁移状态，返回迁移前的状态；迁移到终态时会话被移除
    fn transition(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        next: SessionState,
    ) -> Result<SessionState, SessionError>;

    /// 记录本次尝试检索到的曲目
    fn record_track(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        track: Track,
    ) -> Result<(), SessionError>;

    /// 播放器报错时按重试策略迁移；放弃时会话被移除
    fn on_player_error(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        policy: &RetryPolicy,
    ) -> Result<RetryDecision, SessionError>;

    /// 会话是否仍是该 guild 的当前会话
    fn is_current(&self, guild_id: GuildId, session_id: SessionId) -> bool;

    /// 无条件移除 guild 的会话
    fn close(&self, guild_id: GuildId) -> Option<VoiceSession>;
}
