//! Songbird Voice Gateway - 基于 songbird 的语音连接与播放器
//!
//! 权限从 serenity 缓存读取；URL 音源通过 yt-dlp 流式播放，本地文件直接解码。
//! 播放器的 songbird 事件被转发为 `PlayerEvent`，连接销毁后事件流随之关闭

use async_trait::async_trait;
use reqwest::Client;
use serenity::cache::Cache;
use serenity::model::id::{
    ChannelId as DiscordChannelId, GuildId as DiscordGuildId, UserId as DiscordUserId,
};
use songbird::events::{CoreEvent, Event, EventContext, EventHandler, TrackEvent};
use songbird::input::{File as FileInput, Input, YoutubeDl};
use songbird::tracks::PlayMode;
use songbird::Songbird;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{PlayerEvent, PlayerEvents, VoiceError, VoiceGatewayPort};
use crate::domain::playback::{
    ChannelId, GuildId, Locator, StreamSource, UserId, VoiceCapabilities,
};

/// 网关配置
#[derive(Debug, Clone)]
pub struct SongbirdGatewayConfig {
    /// 播放音量，1.0 为原始音量
    pub volume: f32,
    /// yt-dlp `-f` 格式选择
    pub format: Option<String>,
}

impl Default for SongbirdGatewayConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            format: None,
        }
    }
}

/// Songbird 语音网关
pub struct SongbirdVoiceGateway {
    songbird: Arc<Songbird>,
    cache: Arc<Cache>,
    bot_user_id: UserId,
    client: Client,
    config: SongbirdGatewayConfig,
}

impl SongbirdVoiceGateway {
    pub fn new(
        songbird: Arc<Songbird>,
        cache: Arc<Cache>,
        bot_user_id: UserId,
        client: Client,
        config: SongbirdGatewayConfig,
    ) -> Self {
        Self {
            songbird,
            cache,
            bot_user_id,
            client,
            config,
        }
    }

    fn input_for(&self, source: &StreamSource) -> Input {
        match source.locator() {
            Locator::Url(url) => {
                let mut ytdl = YoutubeDl::new(self.client.clone(), url.clone());
                if let Some(format) = &self.config.format {
                    ytdl = ytdl.user_args(vec!["-f".to_string(), format.clone()]);
                }
                ytdl.into()
            }
            Locator::File(path) => FileInput::new(path.clone()).into(),
        }
    }
}

fn discord_guild(guild_id: GuildId) -> DiscordGuildId {
    DiscordGuildId::new(guild_id.get())
}

/// 把 songbird 轨道事件转发到会话的事件流
struct ForwardTrackEvent {
    tx: mpsc::UnboundedSender<PlayerEvent>,
    event: TrackEvent,
}

#[async_trait]
impl EventHandler for ForwardTrackEvent {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let event = match self.event {
            TrackEvent::Playable => PlayerEvent::Started,
            TrackEvent::Preparing => PlayerEvent::Buffering,
            TrackEvent::End => PlayerEvent::Ended,
            _ => PlayerEvent::Error(error_message(ctx)),
        };
        // 接收端已关闭说明会话已结束
        if self.tx.send(event).is_err() {
            return Some(Event::Cancel);
        }
        None
    }
}

fn error_message(ctx: &EventContext<'_>) -> String {
    if let EventContext::Track(tracks) = ctx {
        for (state, _) in tracks.iter() {
            if let PlayMode::Errored(err) = &state.playing {
                return format!("{:?}", err);
            }
        }
    }
    "unknown player error".to_string()
}

/// 语音驱动断开只记录日志
struct DisconnectLogger {
    guild_id: GuildId,
}

#[async_trait]
impl EventHandler for DisconnectLogger {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            tracing::warn!(
                guild_id = %self.guild_id,
                reason = ?data.reason,
                kind = ?data.kind,
                "Voice driver disconnected"
            );
        }
        None
    }
}

#[async_trait]
impl VoiceGatewayPort for SongbirdVoiceGateway {
    async fn capabilities(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<VoiceCapabilities, VoiceError> {
        let guild = self
            .cache
            .guild(discord_guild(guild_id))
            .ok_or(VoiceError::GuildUnavailable(guild_id))?;
        let channel = guild
            .channels
            .get(&DiscordChannelId::new(channel_id.get()))
            .ok_or(VoiceError::ChannelUnavailable(channel_id))?;
        let member = guild
            .members
            .get(&DiscordUserId::new(self.bot_user_id.get()))
            .ok_or(VoiceError::GuildUnavailable(guild_id))?;

        let permissions = guild.user_permissions_in(channel, member);
        Ok(VoiceCapabilities::new(
            permissions.connect(),
            permissions.speak(),
        ))
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceError> {
        let call = self
            .songbird
            .join(discord_guild(guild_id), DiscordChannelId::new(channel_id.get()))
            .await
            .map_err(|e| VoiceError::JoinFailed(e.to_string()))?;

        let mut call = call.lock().await;
        call.remove_all_global_events();
        call.add_global_event(
            Event::Core(CoreEvent::DriverDisconnect),
            DisconnectLogger { guild_id },
        );

        tracing::info!(guild_id = %guild_id, channel_id = %channel_id, "Joined voice channel");
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, source: StreamSource) -> Result<PlayerEvents, VoiceError> {
        let call = self
            .songbird
            .get(discord_guild(guild_id))
            .ok_or(VoiceError::NotConnected(guild_id))?;

        let input = self.input_for(&source);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut call = call.lock().await;
        call.stop();
        let handle = call.play_input(input);

        for event in [
            TrackEvent::Playable,
            TrackEvent::Preparing,
            TrackEvent::End,
            TrackEvent::Error,
        ] {
            handle
                .add_event(
                    Event::Track(event),
                    ForwardTrackEvent {
                        tx: tx.clone(),
                        event,
                    },
                )
                .map_err(|e| VoiceError::PlaybackFailed(e.to_string()))?;
        }

        if let Err(e) = handle.set_volume(self.config.volume) {
            tracing::warn!(guild_id = %guild_id, error = %e, "Failed to set volume");
        }

        tracing::debug!(
            guild_id = %guild_id,
            source = %source.locator(),
            title = ?source.title(),
            "Track queued on voice connection"
        );
        Ok(rx)
    }

    async fn leave(&self, guild_id: GuildId) -> Result<bool, VoiceError> {
        let guild = discord_guild(guild_id);
        if self.songbird.get(guild).is_none() {
            return Ok(false);
        }

        self.songbird
            .remove(guild)
            .await
            .map_err(|e| VoiceError::LeaveFailed(e.to_string()))?;

        tracing::info!(guild_id = %guild_id, "Voice connection destroyed");
        Ok(true)
    }

    fn is_connected(&self, guild_id: GuildId) -> bool {
        self.songbird.get(discord_guild(guild_id)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SongbirdGatewayConfig::default();
        assert_eq!(config.volume, 1.0);
        assert!(config.format.is_none());
    }

    #[test]
    fn test_guild_id_conversion() {
        assert_eq!(discord_guild(GuildId::new(42)).get(), 42);
    }

    #[tokio::test]
    async fn test_untracked_guild_is_not_connected() {
        let gateway = SongbirdVoiceGateway::new(
            Songbird::serenity(),
            Arc::new(Cache::new()),
            UserId::new(1),
            Client::new(),
            SongbirdGatewayConfig::default(),
        );

        assert!(!gateway.is_connected(GuildId::new(9)));
        assert!(!gateway.leave(GuildId::new(9)).await.unwrap());
        assert!(matches!(
            gateway.capabilities(GuildId::new(9), ChannelId::new(3)).await,
            Err(VoiceError::GuildUnavailable(_))
        ));
    }
}
