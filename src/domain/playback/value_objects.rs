//! Playback Context - Value Objects

use std::path::PathBuf;
use uuid::Uuid;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// 服务器（guild）标识，语音频道的作用域
    GuildId
);
snowflake_id!(
    /// 频道标识（文字或语音）
    ChannelId
);
snowflake_id!(
    /// 用户标识
    UserId
);
snowflake_id!(
    /// 消息标识
    MessageId
);

/// 会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 回复目标 - 回复发起命令的那条消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTarget {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl ReplyTarget {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

/// 媒体定位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// 视频站页面或直链
    Url(String),
    /// 本地音频文件
    File(PathBuf),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Url(url) => write!(f, "{}", url),
            Locator::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 可播放的音源
///
/// 由 Stream Resolver 产生，只被一个会话消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    locator: Locator,
    title: Option<String>,
}

impl StreamSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            locator: Locator::Url(url.into()),
            title: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            locator: Locator::File(path.into()),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// 定位为空的音源视为无效
    pub fn is_valid(&self) -> bool {
        match &self.locator {
            Locator::Url(url) => !url.trim().is_empty(),
            Locator::File(path) => !path.as_os_str().is_empty(),
        }
    }
}

/// 机器人在语音频道内的权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceCapabilities {
    pub connect: bool,
    pub speak: bool,
}

impl VoiceCapabilities {
    pub fn new(connect: bool, speak: bool) -> Self {
        Self { connect, speak }
    }

    pub fn full() -> Self {
        Self::new(true, true)
    }

    /// 加入并推流需要 connect + speak
    pub fn can_stream(&self) -> bool {
        self.connect && self.speak
    }
}

/// 会话要播放的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackRequest {
    /// 自由文本查询，重试时原样重新检索
    Query(String),
    /// 诊断用本地文件，不经过检索
    TestFile(PathBuf),
}

impl PlaybackRequest {
    pub fn is_test_file(&self) -> bool {
        matches!(self, PlaybackRequest::TestFile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_require_connect_and_speak() {
        assert!(VoiceCapabilities::full().can_stream());
        assert!(!VoiceCapabilities::new(true, false).can_stream());
        assert!(!VoiceCapabilities::new(false, true).can_stream());
        assert!(!VoiceCapabilities::default().can_stream());
    }

    #[test]
    fn test_blank_url_source_is_invalid() {
        assert!(!StreamSource::url("   ").is_valid());
        assert!(StreamSource::url("https://www.youtube.com/watch?v=YkgkThdzX-8").is_valid());
    }

    #[test]
    fn test_request_kind() {
        assert!(!PlaybackRequest::Query("Imagine".to_string()).is_test_file());
        assert!(PlaybackRequest::TestFile(PathBuf::from("assets/sample.mp3")).is_test_file());
    }
}
