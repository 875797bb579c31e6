//! Discord Event Handler - serenity 网关事件入口
//!
//! `ready` 时组装依赖缓存与 HTTP 的适配器（语音网关、聊天回复），
//! `message` 把消息转换为 `IncomingMessage` 交给分发器

use reqwest::Client;
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use songbird::Songbird;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::application::commands::{CommandDispatcher, IncomingMessage};
use crate::application::ports::{CatalogPort, SessionRegistryPort, StreamResolverPort};
use crate::domain::playback::{ChannelId, GuildId, MessageId, ReplyTarget, UserId};
use crate::infrastructure::adapters::{SerenityChat, SongbirdGatewayConfig, SongbirdVoiceGateway};
use crate::infrastructure::worker::{SessionWorker, SessionWorkerConfig};

/// 网关就绪前即可构造的依赖
pub struct BotServices {
    pub registry: Arc<dyn SessionRegistryPort>,
    pub catalog: Arc<dyn CatalogPort>,
    pub resolver: Arc<dyn StreamResolverPort>,
    pub songbird: Arc<Songbird>,
    pub http_client: Client,
    pub worker: SessionWorkerConfig,
    pub gateway: SongbirdGatewayConfig,
    pub test_file: PathBuf,
}

pub struct DiscordHandler {
    services: BotServices,
    dispatcher: OnceLock<CommandDispatcher>,
}

impl DiscordHandler {
    pub fn new(services: BotServices) -> Self {
        Self {
            services,
            dispatcher: OnceLock::new(),
        }
    }

    fn build_dispatcher(&self, ctx: &Context, bot_user_id: UserId) -> CommandDispatcher {
        let services = &self.services;

        let voice = Arc::new(SongbirdVoiceGateway::new(
            services.songbird.clone(),
            ctx.cache.clone(),
            bot_user_id,
            services.http_client.clone(),
            services.gateway.clone(),
        ));
        let chat = Arc::new(SerenityChat::new(ctx.http.clone()));

        let worker = Arc::new(SessionWorker::new(
            services.worker.clone(),
            services.registry.clone(),
            services.catalog.clone(),
            services.resolver.clone(),
            voice,
            chat,
        ));

        CommandDispatcher::new(worker, services.test_file.clone())
    }
}

/// 作者当前所在的语音频道（从缓存读取）
fn author_voice_channel(ctx: &Context, msg: &Message) -> Option<ChannelId> {
    let guild_id = msg.guild_id?;
    let guild = ctx.cache.guild(guild_id)?;
    let channel_id = guild.voice_states.get(&msg.author.id)?.channel_id?;
    Some(ChannelId::new(channel_id.get()))
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready");

        if self.dispatcher.get().is_some() {
            // 重连后的 ready，沿用已有的分发器
            return;
        }
        let dispatcher = self.build_dispatcher(&ctx, UserId::new(ready.user.id.get()));
        let _ = self.dispatcher.set(dispatcher);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(dispatcher) = self.dispatcher.get() else {
            tracing::warn!(message_id = %msg.id, "Message received before ready, ignored");
            return;
        };

        let voice_channel = author_voice_channel(&ctx, &msg);
        let incoming = IncomingMessage {
            guild_id: msg.guild_id.map(|id| GuildId::new(id.get())),
            author_is_bot: msg.author.bot,
            voice_channel,
            reply_to: ReplyTarget::new(
                ChannelId::new(msg.channel_id.get()),
                MessageId::new(msg.id.get()),
            ),
            content: msg.content,
        };

        dispatcher.dispatch(incoming).await;
    }
}
