//! Fake Voice Gateway - 内存语音网关
//!
//! 记录所有操作，测试通过 `emit` 注入播放器事件

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::ports::{PlayerEvent, PlayerEvents, VoiceError, VoiceGatewayPort};
use crate::domain::playback::{ChannelId, GuildId, StreamSource, VoiceCapabilities};

/// 网关操作记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOp {
    Join(GuildId, ChannelId),
    Play(GuildId, StreamSource),
    Leave(GuildId),
}

/// Fake Voice Gateway
pub struct FakeVoiceGateway {
    capabilities: Mutex<VoiceCapabilities>,
    join_failure: Mutex<Option<String>>,
    join_latency: Option<Duration>,
    connected: Mutex<HashSet<GuildId>>,
    players: Mutex<HashMap<GuildId, mpsc::UnboundedSender<PlayerEvent>>>,
    ops: Mutex<Vec<GatewayOp>>,
}

impl FakeVoiceGateway {
    pub fn new() -> Self {
        Self {
            capabilities: Mutex::new(VoiceCapabilities::full()),
            join_failure: Mutex::new(None),
            join_latency: None,
            connected: Mutex::new(HashSet::new()),
            players: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn with_capabilities(self, capabilities: VoiceCapabilities) -> Self {
        *self.capabilities.lock().unwrap() = capabilities;
        self
    }

    /// 加入频道前等待，用于模拟握手期间的 stop
    pub fn with_join_latency(mut self, latency: Duration) -> Self {
        self.join_latency = Some(latency);
        self
    }

    pub fn fail_joins(&self, message: impl Into<String>) {
        *self.join_failure.lock().unwrap() = Some(message.into());
    }

    /// 模拟一条在本网关之外建立的连接
    pub fn connect_externally(&self, guild_id: GuildId) {
        self.connected.lock().unwrap().insert(guild_id);
    }

    /// 向 guild 当前播放器注入事件，没有播放器时返回 false
    pub fn emit(&self, guild_id: GuildId, event: PlayerEvent) -> bool {
        self.players
            .lock()
            .unwrap()
            .get(&guild_id)
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }

    pub fn ops(&self) -> Vec<GatewayOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn join_count(&self) -> usize {
        self.count(|op| matches!(op, GatewayOp::Join(..)))
    }

    pub fn play_count(&self) -> usize {
        self.count(|op| matches!(op, GatewayOp::Play(..)))
    }

    pub fn leave_count(&self) -> usize {
        self.count(|op| matches!(op, GatewayOp::Leave(..)))
    }

    fn count(&self, predicate: impl Fn(&GatewayOp) -> bool) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| predicate(op)).count()
    }
}

impl Default for FakeVoiceGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceGatewayPort for FakeVoiceGateway {
    async fn capabilities(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> Result<VoiceCapabilities, VoiceError> {
        Ok(*self.capabilities.lock().unwrap())
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), VoiceError> {
        self.ops
            .lock()
            .unwrap()
            .push(GatewayOp::Join(guild_id, channel_id));

        if let Some(latency) = self.join_latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.join_failure.lock().unwrap().clone() {
            return Err(VoiceError::JoinFailed(message));
        }

        self.connected.lock().unwrap().insert(guild_id);
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, source: StreamSource) -> Result<PlayerEvents, VoiceError> {
        self.ops
            .lock()
            .unwrap()
            .push(GatewayOp::Play(guild_id, source));

        if !self.connected.lock().unwrap().contains(&guild_id) {
            return Err(VoiceError::NotConnected(guild_id));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.players.lock().unwrap().insert(guild_id, tx);
        Ok(rx)
    }

    async fn leave(&self, guild_id: GuildId) -> Result<bool, VoiceError> {
        self.ops.lock().unwrap().push(GatewayOp::Leave(guild_id));
        // 与 songbird 一致：连接销毁后播放器随之销毁，事件流关闭
        self.players.lock().unwrap().remove(&guild_id);
        Ok(self.connected.lock().unwrap().remove(&guild_id))
    }

    fn is_connected(&self, guild_id: GuildId) -> bool {
        self.connected.lock().unwrap().contains(&guild_id)
    }
}
