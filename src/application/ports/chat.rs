//! Chat Port - 聊天回复抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::ReplyTarget;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Failed to send reply: {0}")]
    SendFailed(String),
}

/// Chat Port
///
/// 以纯文本回复发起命令的用户
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn reply(&self, target: ReplyTarget, content: &str) -> Result<(), ChatError>;
}
