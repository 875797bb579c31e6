//! Recording Chat - 记录所有回复

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{ChatError, ChatPort};
use crate::domain::playback::ReplyTarget;

#[derive(Default)]
pub struct RecordingChat {
    replies: Mutex<Vec<(ReplyTarget, String)>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<(ReplyTarget, String)> {
        self.replies.lock().unwrap().clone()
    }

    /// 仅回复内容，按发送顺序
    pub fn messages(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl ChatPort for RecordingChat {
    async fn reply(&self, target: ReplyTarget, content: &str) -> Result<(), ChatError> {
        tracing::debug!(channel_id = %target.channel_id, content = %content, "RecordingChat: reply");
        self.replies
            .lock()
            .unwrap()
            .push((target, content.to_string()));
        Ok(())
    }
}
