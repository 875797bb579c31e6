//! Stream Resolver Port - 音源解析抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::Track;
use crate::domain::playback::StreamSource;

/// 音源解析错误
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    #[error("Resolver failed: {0}")]
    Failed(String),
}

/// Stream Resolver Port
///
/// 根据曲目元数据在视频站上找到可播放的音源
#[async_trait]
pub trait StreamResolverPort: Send + Sync {
    /// 解析音源，没有结果时返回 `Ok(None)`
    async fn resolve(&self, track: &Track) -> Result<Option<StreamSource>, ResolverError>;
}
