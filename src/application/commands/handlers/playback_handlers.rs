//! Playback Command Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::chat_command::help_text;
use crate::application::commands::playback_commands::*;
use crate::application::error::ApplicationError;
use crate::domain::playback::{
    ChannelId, GuildId, PlaybackRequest, ReplyTarget, VoiceSession,
};
use crate::infrastructure::worker::SessionWorker;

/// 登记会话并交给 Worker，返回失败时已经回复过用户
async fn begin_session(
    worker: &Arc<SessionWorker>,
    guild_id: Option<GuildId>,
    voice_channel: Option<ChannelId>,
    reply_to: ReplyTarget,
    request: PlaybackRequest,
) -> Result<PlayResponse, ApplicationError> {
    let (guild_id, channel_id) = match (guild_id, voice_channel) {
        (Some(guild_id), Some(channel_id)) => (guild_id, channel_id),
        _ => {
            let err = ApplicationError::NotInVoiceChannel;
            reply(worker, reply_to, &err.user_message(worker.command_prefix())).await;
            return Err(err);
        }
    };

    let session = VoiceSession::new(guild_id, channel_id, reply_to, request);
    if let Err(e) = worker.registry().try_begin(session.clone()) {
        let err = ApplicationError::from(e);
        tracing::info!(guild_id = %guild_id, error = %err, "Play request rejected");
        reply(worker, reply_to, &err.user_message(worker.command_prefix())).await;
        return Err(err);
    }

    let started = worker.start(session).await?;
    Ok(PlayResponse {
        session_id: started.session_id,
        track: started.track,
        supervisor: started.supervisor,
    })
}

async fn reply(worker: &SessionWorker, target: ReplyTarget, content: &str) {
    if let Err(e) = worker.chat().reply(target, content).await {
        tracing::warn!(channel_id = %target.channel_id, error = %e, "Failed to send reply");
    }
}

/// Play Handler - 检索并播放
pub struct PlayHandler {
    worker: Arc<SessionWorker>,
}

impl PlayHandler {
    pub fn new(worker: Arc<SessionWorker>) -> Self {
        Self { worker }
    }

    pub async fn handle(&self, cmd: PlayCommand) -> Result<PlayResponse, ApplicationError> {
        tracing::info!(guild_id = ?cmd.guild_id, query = %cmd.query, "Play requested");

        begin_session(
            &self.worker,
            cmd.guild_id,
            cmd.voice_channel,
            cmd.reply_to,
            PlaybackRequest::Query(cmd.query),
        )
        .await
    }
}

/// Test Handler - 播放本地诊断文件
pub struct TestHandler {
    worker: Arc<SessionWorker>,
    test_file: PathBuf,
}

impl TestHandler {
    pub fn new(worker: Arc<SessionWorker>, test_file: impl Into<PathBuf>) -> Self {
        Self {
            worker,
            test_file: test_file.into(),
        }
    }

    pub async fn handle(&self, cmd: TestCommand) -> Result<PlayResponse, ApplicationError> {
        tracing::info!(guild_id = ?cmd.guild_id, file = %self.test_file.display(), "Test playback requested");

        begin_session(
            &self.worker,
            cmd.guild_id,
            cmd.voice_channel,
            cmd.reply_to,
            PlaybackRequest::TestFile(self.test_file.clone()),
        )
        .await
    }
}

/// Stop Handler - 取消会话并断开语音连接
pub struct StopHandler {
    worker: Arc<SessionWorker>,
}

impl StopHandler {
    pub fn new(worker: Arc<SessionWorker>) -> Self {
        Self { worker }
    }

    pub async fn handle(&self, cmd: StopCommand) -> Result<StopResponse, ApplicationError> {
        let guild_id = match (cmd.guild_id, cmd.voice_channel) {
            (Some(guild_id), Some(_)) => guild_id,
            _ => {
                reply(
                    &self.worker,
                    cmd.reply_to,
                    "You need to be in a voice channel to stop the music!",
                )
                .await;
                return Err(ApplicationError::NotInVoiceChannel);
            }
        };

        // 先移除会话：进行中的尝试在下一个检查点发现自己已被取消
        let cancelled_session = self.worker.registry().close(guild_id).map(|s| s.id());

        let disconnected = if self.worker.voice().is_connected(guild_id) {
            match self.worker.voice().leave(guild_id).await {
                Ok(left) => left,
                Err(e) => {
                    tracing::warn!(guild_id = %guild_id, error = %e, "Failed to leave voice channel");
                    false
                }
            }
        } else {
            false
        };

        tracing::info!(
            guild_id = %guild_id,
            cancelled_session = ?cancelled_session.map(|id| id.to_string()),
            disconnected = disconnected,
            "Stop handled"
        );

        let message = match (cancelled_session.is_some(), disconnected) {
            (_, true) => "Music stopped and bot disconnected from the voice channel.",
            (true, false) => "Playback cancelled before the bot joined the voice channel.",
            (false, false) => "Bot is not connected to a voice channel.",
        };
        reply(&self.worker, cmd.reply_to, message).await;

        Ok(StopResponse {
            cancelled_session,
            disconnected,
        })
    }
}

/// Help Handler
pub struct HelpHandler {
    worker: Arc<SessionWorker>,
}

impl HelpHandler {
    pub fn new(worker: Arc<SessionWorker>) -> Self {
        Self { worker }
    }

    pub async fn handle(&self, cmd: HelpCommand) -> Result<(), ApplicationError> {
        let text = help_text(self.worker.command_prefix());
        self.worker
            .chat()
            .reply(cmd.reply_to, &text)
            .await
            .map_err(|e| ApplicationError::external(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::ports::{PlayerEvent, SessionRegistryPort, VoiceGatewayPort};
    use crate::domain::catalog::Track;
    use crate::domain::playback::{MessageId, SessionState};
    use crate::infrastructure::adapters::fake::{
        FakeCatalog, FakeResolver, FakeVoiceGateway, RecordingChat,
    };
    use crate::infrastructure::memory::InMemorySessionRegistry;
    use crate::infrastructure::worker::SessionWorkerConfig;

    const GUILD: GuildId = GuildId::new(7);
    const VOICE: ChannelId = ChannelId::new(70);

    struct Fixture {
        worker: Arc<SessionWorker>,
        registry: Arc<InMemorySessionRegistry>,
        catalog: Arc<FakeCatalog>,
        voice: Arc<FakeVoiceGateway>,
        chat: Arc<RecordingChat>,
    }

    fn fixture(catalog: FakeCatalog) -> Fixture {
        let registry = Arc::new(InMemorySessionRegistry::new());
        let catalog = Arc::new(catalog);
        let voice = Arc::new(FakeVoiceGateway::new());
        let chat = Arc::new(RecordingChat::new());
        let worker = Arc::new(SessionWorker::new(
            SessionWorkerConfig::default(),
            registry.clone(),
            catalog.clone(),
            Arc::new(FakeResolver::new()),
            voice.clone(),
            chat.clone(),
        ));
        Fixture {
            worker,
            registry,
            catalog,
            voice,
            chat,
        }
    }

    fn reply_to() -> ReplyTarget {
        ReplyTarget::new(ChannelId::new(1), MessageId::new(99))
    }

    fn play(query: &str) -> PlayCommand {
        PlayCommand {
            guild_id: Some(GUILD),
            voice_channel: Some(VOICE),
            reply_to: reply_to(),
            query: query.to_string(),
        }
    }

    fn stop() -> StopCommand {
        StopCommand {
            guild_id: Some(GUILD),
            voice_channel: Some(VOICE),
            reply_to: reply_to(),
        }
    }

    fn bohemian() -> Track {
        Track::new("Bohemian Rhapsody", vec!["Queen".to_string()])
    }

    #[tokio::test]
    async fn test_play_requires_voice_channel() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let handler = PlayHandler::new(f.worker.clone());

        let cmd = PlayCommand {
            voice_channel: None,
            ..play("Bohemian Rhapsody")
        };
        let err = handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, ApplicationError::NotInVoiceChannel));
        assert_eq!(
            f.chat.messages(),
            vec!["You need to be in a voice channel to play music!"]
        );
        assert_eq!(f.catalog.search_count(), 0);
    }

    #[tokio::test]
    async fn test_play_replies_once_with_now_playing() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let handler = PlayHandler::new(f.worker.clone());

        let resp = handler.handle(play("Bohemian Rhapsody")).await.unwrap();

        assert_eq!(resp.track, Some(bohemian()));
        assert!(f.registry.is_current(GUILD, resp.session_id));
        assert_eq!(
            f.chat.replies(),
            vec![(reply_to(), "Now playing: Bohemian Rhapsody by Queen".to_string())]
        );
    }

    #[tokio::test]
    async fn test_concurrent_play_is_rejected() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let handler = PlayHandler::new(f.worker.clone());

        let first = handler.handle(play("Bohemian Rhapsody")).await.unwrap();
        let err = handler.handle(play("Imagine")).await.unwrap_err();

        assert!(matches!(err, ApplicationError::SessionBusy(g) if g == GUILD));
        assert!(f.registry.is_current(GUILD, first.session_id));
        assert_eq!(f.catalog.search_count(), 1);
        assert_eq!(
            f.chat.messages().last().map(String::as_str),
            Some("Something is already playing in this server. Use !stop first.")
        );
    }

    #[tokio::test]
    async fn test_stop_with_connection_leaves() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let play_handler = PlayHandler::new(f.worker.clone());
        let stop_handler = StopHandler::new(f.worker.clone());

        let playing = play_handler.handle(play("Bohemian Rhapsody")).await.unwrap();
        let resp = stop_handler.handle(stop()).await.unwrap();

        assert_eq!(resp.cancelled_session, Some(playing.session_id));
        assert!(resp.disconnected);
        assert!(!f.voice.is_connected(GUILD));
        assert!(f.registry.get(GUILD).is_err());
        assert_eq!(
            f.chat.messages().last().map(String::as_str),
            Some("Music stopped and bot disconnected from the voice channel.")
        );

        // 事件流随连接关闭，监督任务静默退出
        playing.supervisor.await.unwrap();
        assert_eq!(f.chat.messages().len(), 2);
        assert_eq!(f.voice.leave_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_without_connection_is_harmless() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let handler = StopHandler::new(f.worker.clone());

        let resp = handler.handle(stop()).await.unwrap();

        assert_eq!(
            resp,
            StopResponse {
                cancelled_session: None,
                disconnected: false
            }
        );
        assert_eq!(f.voice.leave_count(), 0);
        assert_eq!(f.chat.messages(), vec!["Bot is not connected to a voice channel."]);
    }

    #[tokio::test]
    async fn test_stop_disconnects_foreign_connection() {
        let f = fixture(FakeCatalog::always(bohemian()));
        f.voice.connect_externally(GUILD);
        let handler = StopHandler::new(f.worker.clone());

        let resp = handler.handle(stop()).await.unwrap();

        assert!(resp.disconnected);
        assert!(resp.cancelled_session.is_none());
        assert!(!f.voice.is_connected(GUILD));
    }

    #[tokio::test]
    async fn test_stop_requires_voice_channel() {
        let f = fixture(FakeCatalog::always(bohemian()));
        f.voice.connect_externally(GUILD);
        let handler = StopHandler::new(f.worker.clone());

        let cmd = StopCommand {
            voice_channel: None,
            ..stop()
        };
        let err = handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, ApplicationError::NotInVoiceChannel));
        assert!(f.voice.is_connected(GUILD));
        assert_eq!(
            f.chat.messages(),
            vec!["You need to be in a voice channel to stop the music!"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_search_prevents_join() {
        let f = fixture(FakeCatalog::always(bohemian()).with_latency(Duration::from_secs(3)));
        let play_handler = Arc::new(PlayHandler::new(f.worker.clone()));
        let stop_handler = StopHandler::new(f.worker.clone());

        let pending = {
            let handler = play_handler.clone();
            tokio::spawn(async move { handler.handle(play("Bohemian Rhapsody")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.registry.get(GUILD).unwrap().state(), SessionState::Searching);

        let resp = stop_handler.handle(stop()).await.unwrap();
        assert!(resp.cancelled_session.is_some());
        assert!(!resp.disconnected);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, ApplicationError::Cancelled));
        assert_eq!(f.voice.join_count(), 0);
        assert_eq!(
            f.chat.messages(),
            vec!["Playback cancelled before the bot joined the voice channel."]
        );
    }

    #[tokio::test]
    async fn test_play_after_playback_ended_is_accepted() {
        let f = fixture(FakeCatalog::always(bohemian()));
        let handler = PlayHandler::new(f.worker.clone());

        let first = handler.handle(play("Bohemian Rhapsody")).await.unwrap();
        assert!(f.voice.emit(GUILD, PlayerEvent::Ended));
        first.supervisor.await.unwrap();

        let second = handler.handle(play("Bohemian Rhapsody")).await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(f.voice.join_count(), 2);
    }

    #[tokio::test]
    async fn test_test_command_plays_configured_file() {
        let f = fixture(FakeCatalog::new());
        let handler = TestHandler::new(f.worker.clone(), "assets/sample.mp3");

        let resp = handler
            .handle(TestCommand {
                guild_id: Some(GUILD),
                voice_channel: Some(VOICE),
                reply_to: reply_to(),
            })
            .await
            .unwrap();

        assert!(resp.track.is_none());
        assert_eq!(f.catalog.search_count(), 0);
        assert_eq!(f.chat.messages(), vec!["Playing test file."]);
    }

    #[tokio::test]
    async fn test_help_lists_four_commands() {
        let f = fixture(FakeCatalog::new());
        let handler = HelpHandler::new(f.worker.clone());

        handler.handle(HelpCommand { reply_to: reply_to() }).await.unwrap();

        let messages = f.chat.messages();
        assert_eq!(messages.len(), 1);
        let lines: Vec<&str> = messages[0].lines().collect();
        assert_eq!(lines[0], "Available commands:");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("`!play <song>`"));
        assert!(lines[2].starts_with("`!stop`"));
        assert!(lines[3].starts_with("`!help`"));
        assert!(lines[4].starts_with("`!test`"));
    }
}
