//! Serenity Chat - 以 Discord 消息回复的形式发送文本

use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::id::{ChannelId as DiscordChannelId, MessageId as DiscordMessageId};
use std::sync::Arc;

use crate::application::ports::{ChatError, ChatPort};
use crate::domain::playback::ReplyTarget;

pub struct SerenityChat {
    http: Arc<Http>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatPort for SerenityChat {
    async fn reply(&self, target: ReplyTarget, content: &str) -> Result<(), ChatError> {
        let channel_id = DiscordChannelId::new(target.channel_id.get());
        let message_id = DiscordMessageId::new(target.message_id.get());

        let message = CreateMessage::new()
            .content(content)
            .reference_message((channel_id, message_id));

        channel_id
            .send_message(self.http.as_ref(), message)
            .await
            .map_err(|e| ChatError::SendFailed(e.to_string()))?;

        tracing::debug!(channel_id = %target.channel_id, "Reply sent");
        Ok(())
    }
}
