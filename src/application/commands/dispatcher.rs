//! Command Dispatcher - 把聊天消息路由到命令处理器

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::chat_command::ChatCommand;
use crate::application::commands::handlers::{HelpHandler, PlayHandler, StopHandler, TestHandler};
use crate::application::commands::playback_commands::*;
use crate::application::error::ApplicationError;
use crate::domain::playback::{ChannelId, GuildId, ReplyTarget};
use crate::infrastructure::worker::SessionWorker;

/// 收到的聊天消息，与 Discord 类型解耦
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// 私信时为 None
    pub guild_id: Option<GuildId>,
    pub author_is_bot: bool,
    /// 作者当前所在的语音频道
    pub voice_channel: Option<ChannelId>,
    pub reply_to: ReplyTarget,
    pub content: String,
}

pub struct CommandDispatcher {
    prefix: String,
    play: PlayHandler,
    stop: StopHandler,
    test: TestHandler,
    help: HelpHandler,
}

impl CommandDispatcher {
    pub fn new(worker: Arc<SessionWorker>, test_file: impl Into<PathBuf>) -> Self {
        Self {
            prefix: worker.command_prefix().to_string(),
            play: PlayHandler::new(worker.clone()),
            stop: StopHandler::new(worker.clone()),
            test: TestHandler::new(worker.clone(), test_file),
            help: HelpHandler::new(worker),
        }
    }

    /// 处理一条消息，返回被执行的命令；机器人消息和非命令消息返回 None
    pub async fn dispatch(&self, message: IncomingMessage) -> Option<ChatCommand> {
        if message.author_is_bot {
            return None;
        }
        let command = ChatCommand::parse(&message.content, &self.prefix)?;

        tracing::debug!(
            command = command.name(),
            guild_id = ?message.guild_id,
            channel_id = %message.reply_to.channel_id,
            "Command received"
        );

        let result = match &command {
            ChatCommand::Play(query) => self
                .play
                .handle(PlayCommand {
                    guild_id: message.guild_id,
                    voice_channel: message.voice_channel,
                    reply_to: message.reply_to,
                    query: query.clone(),
                })
                .await
                .map(|_| ()),
            ChatCommand::Stop => self
                .stop
                .handle(StopCommand {
                    guild_id: message.guild_id,
                    voice_channel: message.voice_channel,
                    reply_to: message.reply_to,
                })
                .await
                .map(|_| ()),
            ChatCommand::Test => self
                .test
                .handle(TestCommand {
                    guild_id: message.guild_id,
                    voice_channel: message.voice_channel,
                    reply_to: message.reply_to,
                })
                .await
                .map(|_| ()),
            ChatCommand::Help => {
                self.help
                    .handle(HelpCommand {
                        reply_to: message.reply_to,
                    })
                    .await
            }
        };

        // 处理器已经回复过用户，这里只记录
        if let Err(e) = result {
            log_outcome(&command, &e);
        }
        Some(command)
    }
}

fn log_outcome(command: &ChatCommand, err: &ApplicationError) {
    match err {
        ApplicationError::External(_) | ApplicationError::Internal(_) => {
            tracing::error!(command = command.name(), error = %err, "Command failed");
        }
        _ if err.is_silent() => {
            tracing::debug!(command = command.name(), "Command cancelled");
        }
        _ => {
            tracing::info!(command = command.name(), error = %err, "Command rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::application::ports::SessionRegistryPort;
    use crate::domain::catalog::Track;
    use crate::domain::playback::MessageId;
    use crate::infrastructure::adapters::fake::{
        FakeCatalog, FakeResolver, FakeVoiceGateway, RecordingChat,
    };
    use crate::infrastructure::memory::InMemorySessionRegistry;
    use crate::infrastructure::worker::SessionWorkerConfig;

    fn setup(prefix: &str) -> (CommandDispatcher, Arc<FakeCatalog>, Arc<RecordingChat>) {
        let catalog = Arc::new(FakeCatalog::always(Track::new(
            "Imagine",
            vec!["John Lennon".to_string()],
        )));
        let chat = Arc::new(RecordingChat::new());
        let registry: Arc<dyn SessionRegistryPort> = Arc::new(InMemorySessionRegistry::new());
        let worker = Arc::new(SessionWorker::new(
            SessionWorkerConfig {
                command_prefix: prefix.to_string(),
                ..Default::default()
            },
            registry,
            catalog.clone(),
            Arc::new(FakeResolver::new()),
            Arc::new(FakeVoiceGateway::new()),
            chat.clone(),
        ));
        (
            CommandDispatcher::new(worker, "assets/sample.mp3"),
            catalog,
            chat,
        )
    }

    fn message(content: &str) -> IncomingMessage {
        IncomingMessage {
            guild_id: Some(GuildId::new(5)),
            author_is_bot: false,
            voice_channel: Some(ChannelId::new(50)),
            reply_to: ReplyTarget::new(ChannelId::new(8), MessageId::new(9)),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_bot_messages_are_ignored() {
        let (dispatcher, catalog, chat) = setup("!");
        let msg = IncomingMessage {
            author_is_bot: true,
            ..message("!play Imagine")
        };

        assert!(dispatcher.dispatch(msg).await.is_none());
        assert_eq!(catalog.search_count(), 0);
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_non_commands_are_ignored() {
        let (dispatcher, _, chat) = setup("!");

        for content in ["hello", "!play", "!Stop", "!helpme", "?help"] {
            assert!(dispatcher.dispatch(message(content)).await.is_none(), "{}", content);
        }
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_play_routes_query() {
        let (dispatcher, catalog, chat) = setup("!");

        let command = dispatcher.dispatch(message("!play Imagine")).await;

        assert_eq!(command, Some(ChatCommand::Play("Imagine".to_string())));
        assert_eq!(catalog.queries(), vec!["Imagine"]);
        assert_eq!(chat.messages(), vec!["Now playing: Imagine by John Lennon"]);
    }

    #[tokio::test]
    async fn test_play_from_direct_message_needs_voice_channel() {
        let (dispatcher, catalog, chat) = setup("!");
        let msg = IncomingMessage {
            guild_id: None,
            voice_channel: None,
            ..message("!play Imagine")
        };

        dispatcher.dispatch(msg).await;

        assert_eq!(catalog.search_count(), 0);
        assert_eq!(
            chat.messages(),
            vec!["You need to be in a voice channel to play music!"]
        );
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let (dispatcher, _, chat) = setup("$");

        assert!(dispatcher.dispatch(message("!help")).await.is_none());
        assert_eq!(dispatcher.dispatch(message("$help")).await, Some(ChatCommand::Help));
        assert!(chat.messages()[0].contains("`$play <song>`"));
    }
}
