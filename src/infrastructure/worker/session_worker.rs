//! Session Worker - 语音会话驱动
//!
//! 一次播放尝试: Searching → Resolving → Connecting → Playing，
//! 之后由后台任务消费播放器事件，处理结束、出错重试与取消。
//! 每个挂起点之后都会用注册表重新校验会话，已被 stop 的尝试静默退出。

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::error::{ApplicationError, LookupSource};
use crate::application::ports::{
    CatalogPort, ChatPort, PlayerEvent, PlayerEvents, SessionError, SessionRegistryPort,
    StreamResolverPort, VoiceGatewayPort,
};
use crate::domain::catalog::Track;
use crate::domain::playback::{
    PlaybackRequest, RetryDecision, RetryPolicy, SessionId, SessionState, StreamSource,
    VoiceSession,
};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct SessionWorkerConfig {
    pub retry: RetryPolicy,
    /// 命令前缀，用于回复中的提示
    pub command_prefix: String,
}

impl Default for SessionWorkerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            command_prefix: "!".to_string(),
        }
    }
}

/// 一次成功的尝试
pub struct Attempt {
    pub events: PlayerEvents,
    pub track: Option<Track>,
}

/// 已开始播放的会话
#[derive(Debug)]
pub struct PlaybackStarted {
    pub session_id: SessionId,
    pub track: Option<Track>,
    pub supervisor: JoinHandle<()>,
}

/// 事件流的结局
#[derive(Debug, PartialEq, Eq)]
enum WatchOutcome {
    Ended,
    Failed(String),
    Cancelled,
}

/// 会话 Worker
pub struct SessionWorker {
    config: SessionWorkerConfig,
    registry: Arc<dyn SessionRegistryPort>,
    catalog: Arc<dyn CatalogPort>,
    resolver: Arc<dyn StreamResolverPort>,
    voice: Arc<dyn VoiceGatewayPort>,
    chat: Arc<dyn ChatPort>,
}

impl SessionWorker {
    pub fn new(
        config: SessionWorkerConfig,
        registry: Arc<dyn SessionRegistryPort>,
        catalog: Arc<dyn CatalogPort>,
        resolver: Arc<dyn StreamResolverPort>,
        voice: Arc<dyn VoiceGatewayPort>,
        chat: Arc<dyn ChatPort>,
    ) -> Self {
        Self {
            config,
            registry,
            catalog,
            resolver,
            voice,
            chat,
        }
    }

    pub fn registry(&self) -> &Arc<dyn SessionRegistryPort> {
        &self.registry
    }

    pub fn voice(&self) -> &Arc<dyn VoiceGatewayPort> {
        &self.voice
    }

    pub fn chat(&self) -> &Arc<dyn ChatPort> {
        &self.chat
    }

    pub fn command_prefix(&self) -> &str {
        &self.config.command_prefix
    }

    /// 启动已登记的会话
    ///
    /// 运行第一次尝试；成功后在后台监督播放器事件，失败时回复用户并结束会话
    pub async fn start(self: &Arc<Self>, session: VoiceSession) -> Result<PlaybackStarted, ApplicationError> {
        match self.run_attempt(&session).await {
            Ok(attempt) => {
                let worker = Arc::clone(self);
                let session_id = session.id();
                let supervisor = tokio::spawn(worker.supervise(session, attempt.events));
                Ok(PlaybackStarted {
                    session_id,
                    track: attempt.track,
                    supervisor,
                })
            }
            Err(err) => {
                self.finish_with_error(&session, &err).await;
                Err(err)
            }
        }
    }

    /// 运行一次完整尝试，直到播放器挂上连接并回复 "Now playing"
    pub async fn run_attempt(&self, session: &VoiceSession) -> Result<Attempt, ApplicationError> {
        let (source, track) = match session.request() {
            PlaybackRequest::Query(query) => {
                let (source, track) = self.lookup(session, query).await?;
                (source, Some(track))
            }
            PlaybackRequest::TestFile(path) => (StreamSource::file(path.clone()), None),
        };

        let events = self.connect_and_play(session, source).await?;

        let message = match &track {
            Some(track) => format!("Now playing: {}", track),
            None => "Playing test file.".to_string(),
        };
        self.reply(session, &message).await;

        tracing::info!(
            guild_id = %session.guild_id(),
            session_id = %session.id(),
            track = ?track.as_ref().map(|t| t.to_string()),
            "Playback started"
        );

        Ok(Attempt { events, track })
    }

    /// Searching → Resolving
    async fn lookup(
        &self,
        session: &VoiceSession,
        query: &str,
    ) -> Result<(StreamSource, Track), ApplicationError> {
        let guild_id = session.guild_id();
        let session_id = session.id();

        self.registry
            .transition(guild_id, session_id, SessionState::Searching)?;

        let track = self
            .catalog
            .search(query)
            .await?
            .ok_or(ApplicationError::NoResults(LookupSource::Catalog))?;

        tracing::info!(
            guild_id = %guild_id,
            query = %query,
            title = %track.title(),
            artists = %track.display_artists(),
            "Catalog track found"
        );

        // Check: 检索期间会话可能已被 stop
        self.registry
            .record_track(guild_id, session_id, track.clone())?;
        self.registry
            .transition(guild_id, session_id, SessionState::Resolving)?;

        let source = self
            .resolver
            .resolve(&track)
            .await?
            .filter(StreamSource::is_valid)
            .ok_or(ApplicationError::NoResults(LookupSource::Resolver))?;

        tracing::info!(guild_id = %guild_id, source = %source.locator(), "Stream source resolved");

        Ok((source, track))
    }

    /// Connecting → Playing
    async fn connect_and_play(
        &self,
        session: &VoiceSession,
        source: StreamSource,
    ) -> Result<PlayerEvents, ApplicationError> {
        let guild_id = session.guild_id();
        let channel_id = session.channel_id();
        let session_id = session.id();

        self.registry
            .transition(guild_id, session_id, SessionState::Connecting)?;

        let capabilities = self.voice.capabilities(guild_id, channel_id).await?;
        if !capabilities.can_stream() {
            tracing::warn!(
                guild_id = %guild_id,
                channel_id = %channel_id,
                connect = capabilities.connect,
                speak = capabilities.speak,
                "Missing voice permissions"
            );
            return Err(ApplicationError::PermissionDenied);
        }

        self.voice.join(guild_id, channel_id).await?;

        // Check: 加入期间会话可能已被 stop
        if !self.registry.is_current(guild_id, session_id) {
            self.release_stale_connection(session).await;
            return Err(ApplicationError::Cancelled);
        }

        let events = match self.voice.play(guild_id, source).await {
            Ok(events) => events,
            Err(e) => {
                self.leave(session).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .registry
            .transition(guild_id, session_id, SessionState::Playing)
        {
            if e.is_cancellation() {
                self.release_stale_connection(session).await;
            } else {
                self.leave(session).await;
            }
            return Err(e.into());
        }

        Ok(events)
    }

    /// 后台监督：消费播放器事件直到播放结束、放弃或被取消
    pub async fn supervise(self: Arc<Self>, session: VoiceSession, events: PlayerEvents) {
        let guild_id = session.guild_id();
        let session_id = session.id();
        let mut events = events;

        loop {
            match self.watch(&session, &mut events).await {
                WatchOutcome::Cancelled => {
                    tracing::debug!(guild_id = %guild_id, session_id = %session_id, "Supervisor cancelled");
                    return;
                }
                WatchOutcome::Ended => {
                    tracing::info!(guild_id = %guild_id, "Playback ended, destroying connection");
                    if self.registry.is_current(guild_id, session_id) {
                        self.leave(&session).await;
                        self.settle(self.registry.transition(guild_id, session_id, SessionState::Idle));
                    }
                    return;
                }
                WatchOutcome::Failed(message) => {
                    let err = ApplicationError::Playback(message);
                    tracing::error!(guild_id = %guild_id, error = %err, "Error playing track");

                    if !self.registry.is_current(guild_id, session_id) {
                        return;
                    }
                    // 先销毁连接，再决定是否重试
                    self.leave(&session).await;

                    match self.registry.on_player_error(guild_id, session_id, &self.config.retry) {
                        Ok(RetryDecision::Retry { retry }) => {
                            self.reply(&session, "An error occurred while playing the track. Retrying...")
                                .await;
                            tracing::info!(
                                guild_id = %guild_id,
                                retry = retry,
                                max_retries = self.config.retry.max_retries,
                                delay_ms = self.config.retry.delay.as_millis() as u64,
                                "Retry scheduled"
                            );

                            tokio::time::sleep(self.config.retry.delay).await;

                            // Check: 等待期间会话可能已被 stop
                            if !self.registry.is_current(guild_id, session_id) {
                                tracing::debug!(guild_id = %guild_id, "Session stopped during retry delay");
                                return;
                            }

                            match self.run_attempt(&session).await {
                                Ok(attempt) => {
                                    events = attempt.events;
                                }
                                Err(err) => {
                                    self.finish_with_error(&session, &err).await;
                                    return;
                                }
                            }
                        }
                        Ok(RetryDecision::GiveUp { attempts }) => {
                            let message = if session.request().is_test_file() {
                                "There was an error playing the test file.".to_string()
                            } else {
                                format!("Playback failed after {} attempts. Giving up.", attempts)
                            };
                            self.reply(&session, &message).await;
                            return;
                        }
                        Err(e) if e.is_cancellation() => return,
                        Err(e) => {
                            tracing::error!(guild_id = %guild_id, error = %e, "Failed to apply retry policy");
                            self.registry.close(guild_id);
                            self.reply(&session, &ApplicationError::from(e).user_message(self.command_prefix()))
                                .await;
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn watch(&self, session: &VoiceSession, events: &mut PlayerEvents) -> WatchOutcome {
        let guild_id = session.guild_id();

        while let Some(event) = events.recv().await {
            match event {
                PlayerEvent::Started => {
                    tracing::info!(guild_id = %guild_id, "The audio player has started playing");
                }
                PlayerEvent::Buffering => {
                    tracing::info!(guild_id = %guild_id, "Audio player is buffering");
                }
                PlayerEvent::Ended => return WatchOutcome::Ended,
                PlayerEvent::Error(message) => return WatchOutcome::Failed(message),
            }
        }

        // 事件流关闭：连接已被销毁
        if self.registry.is_current(guild_id, session.id()) {
            tracing::warn!(guild_id = %guild_id, "Player event stream closed unexpectedly");
            WatchOutcome::Ended
        } else {
            WatchOutcome::Cancelled
        }
    }

    /// 尝试失败：结束会话并回复一次
    async fn finish_with_error(&self, session: &VoiceSession, err: &ApplicationError) {
        let guild_id = session.guild_id();

        match err {
            ApplicationError::Cancelled => {
                tracing::debug!(guild_id = %guild_id, session_id = %session.id(), "Attempt cancelled");
                return;
            }
            ApplicationError::External(_) | ApplicationError::Internal(_) => {
                tracing::error!(guild_id = %guild_id, error = %err, "Error playing track");
            }
            _ => {
                tracing::warn!(guild_id = %guild_id, error = %err, "Playback attempt aborted");
            }
        }

        let outcome = self
            .registry
            .transition(guild_id, session.id(), SessionState::Disconnected);
        if matches!(&outcome, Err(e) if e.is_cancellation()) {
            return;
        }
        self.settle(outcome);

        let message = match err {
            ApplicationError::External(_) | ApplicationError::Internal(_)
                if session.request().is_test_file() =>
            {
                "There was an error playing the test file.".to_string()
            }
            _ => err.user_message(self.command_prefix()),
        };
        self.reply(session, &message).await;
    }

    /// 被取消的尝试加入了频道：仅当没有新会话占用连接时才离开
    async fn release_stale_connection(&self, session: &VoiceSession) {
        let guild_id = session.guild_id();
        let occupied = self
            .registry
            .get(guild_id)
            .map(|current| current.id() != session.id() && current.state().holds_connection())
            .unwrap_or(false);
        if occupied {
            tracing::debug!(guild_id = %guild_id, "Connection now owned by a newer session");
            return;
        }
        self.leave(session).await;
    }

    async fn leave(&self, session: &VoiceSession) {
        let guild_id = session.guild_id();
        if let Err(e) = self.voice.leave(guild_id).await {
            tracing::warn!(guild_id = %guild_id, error = %e, "Failed to leave voice channel");
        }
    }

    async fn reply(&self, session: &VoiceSession, content: &str) {
        if let Err(e) = self.chat.reply(session.reply_to(), content).await {
            tracing::warn!(guild_id = %session.guild_id(), error = %e, "Failed to send reply");
        }
    }

    fn settle(&self, outcome: Result<SessionState, SessionError>) {
        if let Err(e) = outcome {
            if !e.is_cancellation() {
                tracing::warn!(error = %e, "Session transition failed");
            }
        }
    }
}
