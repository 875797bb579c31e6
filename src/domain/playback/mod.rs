//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 单个 guild 的语音会话状态机
//! - 播放错误的重试策略
//! - 音源、权限等值对象

mod aggregate;
mod errors;
mod state;
mod value_objects;

pub use aggregate::{RetryDecision, RetryPolicy, VoiceSession};
pub use errors::PlaybackError;
pub use state::SessionState;
pub use value_objects::{
    ChannelId, GuildId, Locator, MessageId, PlaybackRequest, ReplyTarget, SessionId,
    StreamSource, UserId, VoiceCapabilities,
};
