//! 应用层错误定义
//!
//! 统一的命令错误类型，以及到用户可见回复的映射

use thiserror::Error;

use crate::application::ports::{CatalogError, ResolverError, SessionError, VoiceError};
use crate::domain::playback::GuildId;

/// 检索无结果的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Catalog,
    Resolver,
}

impl LookupSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupSource::Catalog => "catalog",
            LookupSource::Resolver => "resolver",
        }
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 曲库或音源解析没有结果
    #[error("No results from {}", .0.as_str())]
    NoResults(LookupSource),

    /// 缺少加入/发言权限
    #[error("Missing connect or speak permission")]
    PermissionDenied,

    /// 发起者不在语音频道内
    #[error("Requester is not in a voice channel")]
    NotInVoiceChannel,

    /// 该 guild 已有活动会话
    #[error("Session already active for guild {0}")]
    SessionBusy(GuildId),

    /// 连接建立后播放器报错
    #[error("Playback error: {0}")]
    Playback(String),

    /// 会话被 stop 取消
    #[error("Session cancelled")]
    Cancelled,

    /// 外部服务错误
    #[error("External service error: {0}")]
    External(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// 创建外部服务错误
    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }

    /// 是否应静默处理（不回复用户）
    pub fn is_silent(&self) -> bool {
        matches!(self, ApplicationError::Cancelled)
    }

    /// 用户可见的回复文本
    ///
    /// `prefix` 为命令前缀，用于提示下一步操作
    pub fn user_message(&self, prefix: &str) -> String {
        match self {
            ApplicationError::NoResults(LookupSource::Catalog) => {
                "No results found on Spotify.".to_string()
            }
            ApplicationError::NoResults(LookupSource::Resolver) => {
                "No results found on YouTube.".to_string()
            }
            ApplicationError::PermissionDenied => {
                "I need permissions to join and speak in your voice channel!".to_string()
            }
            ApplicationError::NotInVoiceChannel => {
                "You need to be in a voice channel to play music!".to_string()
            }
            ApplicationError::SessionBusy(_) => format!(
                "Something is already playing in this server. Use {}stop first.",
                prefix
            ),
            ApplicationError::Playback(_) => {
                "An error occurred while playing the track.".to_string()
            }
            ApplicationError::Cancelled => String::new(),
            ApplicationError::External(_) | ApplicationError::Internal(_) => {
                "There was an error playing the track.".to_string()
            }
        }
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(err: CatalogError) -> Self {
        Self::External(format!("catalog: {}", err))
    }
}

impl From<ResolverError> for ApplicationError {
    fn from(err: ResolverError) -> Self {
        Self::External(format!("resolver: {}", err))
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::External(format!("voice: {}", err))
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadyActive(guild_id) => Self::SessionBusy(guild_id),
            err if err.is_cancellation() => Self::Cancelled,
            err => Self::Internal(err.to_string()),
        }
    }
}
