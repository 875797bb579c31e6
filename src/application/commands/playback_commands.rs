//! Playback Commands - 播放相关命令

use tokio::task::JoinHandle;

use crate::domain::catalog::Track;
use crate::domain::playback::{ChannelId, GuildId, ReplyTarget, SessionId};

/// 播放命令
#[derive(Debug, Clone)]
pub struct PlayCommand {
    pub guild_id: Option<GuildId>,
    /// 发起者当前所在的语音频道
    pub voice_channel: Option<ChannelId>,
    pub reply_to: ReplyTarget,
    pub query: String,
}

/// 播放响应
#[derive(Debug)]
pub struct PlayResponse {
    pub session_id: SessionId,
    pub track: Option<Track>,
    /// 播放器事件监督任务，播放结束 / 放弃 / 被 stop 时完成
    pub supervisor: JoinHandle<()>,
}

/// 停止命令
#[derive(Debug, Clone)]
pub struct StopCommand {
    pub guild_id: Option<GuildId>,
    pub voice_channel: Option<ChannelId>,
    pub reply_to: ReplyTarget,
}

/// 停止响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopResponse {
    /// 被取消的会话
    pub cancelled_session: Option<SessionId>,
    /// 是否断开了语音连接
    pub disconnected: bool,
}

/// 播放诊断用本地文件
#[derive(Debug, Clone)]
pub struct TestCommand {
    pub guild_id: Option<GuildId>,
    pub voice_channel: Option<ChannelId>,
    pub reply_to: ReplyTarget,
}

/// 帮助命令
#[derive(Debug, Clone)]
pub struct HelpCommand {
    pub reply_to: ReplyTarget,
}
