//! In-Memory Session Registry Implementation

use dashmap::mapref::entry::Entry;
use chrono::Utc;
use dashmap::DashMap;

use crate::application::ports::{SessionError, SessionRegistryPort};
use crate::domain::catalog::Track;
use crate::domain::playback::{
    GuildId, RetryDecision, RetryPolicy, SessionId, SessionState, VoiceSession,
};

/// 内存会话注册表
///
/// guild -> 当前会话；会话到达终态即移除
pub struct InMemorySessionRegistry {
    sessions: DashMap<GuildId, VoiceSession>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// 对当前会话执行修改；会话 ID 不匹配时返回 Superseded
    fn with_current<T>(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        f: impl FnOnce(&mut VoiceSession) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut session = self
            .sessions
            .get_mut(&guild_id)
            .ok_or(SessionError::NotFound(guild_id))?;
        if session.id() != session_id {
            return Err(SessionError::Superseded(session_id));
        }
        f(&mut *session)
    }

    /// 会话处于终态时移除（仅当仍是同一个会话）
    fn remove_if_terminal(&self, guild_id: GuildId, session_id: SessionId) {
        let removed = self
            .sessions
            .remove_if(&guild_id, |_, s| s.id() == session_id && s.state().is_terminal());
        if let Some((_, session)) = removed {
            tracing::info!(
                guild_id = %guild_id,
                session_id = %session_id,
                state = %session.state(),
                attempts = session.attempt_count(),
                track = ?session.track().map(|t| t.to_string()),
                duration_ms = (session.updated_at() - session.created_at()).num_milliseconds(),
                "Session finished"
            );
        }
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistryPort for InMemorySessionRegistry {
    fn try_begin(&self, session: VoiceSession) -> Result<SessionId, SessionError> {
        let guild_id = session.guild_id();
        let session_id = session.id();
        match self.sessions.entry(guild_id) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    guild_id = %guild_id,
                    active_session = %existing.get().id(),
                    state = %existing.get().state(),
                    "Session rejected, guild busy"
                );
                Err(SessionError::AlreadyActive(guild_id))
            }
            Entry::Vacant(slot) => {
                slot.insert(session);
                tracing::info!(guild_id = %guild_id, session_id = %session_id, "Session created");
                Ok(session_id)
            }
        }
    }

    fn get(&self, guild_id: GuildId) -> Result<VoiceSession, SessionError> {
        self.sessions
            .get(&guild_id)
            .map(|s| s.clone())
            .ok_or(SessionError::NotFound(guild_id))
    }

    fn transition(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        next: SessionState,
    ) -> Result<SessionState, SessionError> {
        let previous = self.with_current(guild_id, session_id, |session| {
            Ok(session.transition(next)?)
        })?;

        tracing::debug!(
            guild_id = %guild_id,
            session_id = %session_id,
            old_state = %previous,
            new_state = %next,
            "Session state changed"
        );

        if next.is_terminal() {
            self.remove_if_terminal(guild_id, session_id);
        }
        Ok(previous)
    }

    fn record_track(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        track: Track,
    ) -> Result<(), SessionError> {
        self.with_current(guild_id, session_id, |session| {
            session.record_track(track);
            Ok(())
        })
    }

    fn on_player_error(
        &self,
        guild_id: GuildId,
        session_id: SessionId,
        policy: &RetryPolicy,
    ) -> Result<RetryDecision, SessionError> {
        let decision = self.with_current(guild_id, session_id, |session| {
            Ok(session.on_player_error(policy)?)
        })?;

        tracing::debug!(
            guild_id = %guild_id,
            session_id = %session_id,
            decision = ?decision,
            "Player error handled"
        );

        if matches!(decision, RetryDecision::GiveUp { .. }) {
            self.remove_if_terminal(guild_id, session_id);
        }
        Ok(decision)
    }

    fn is_current(&self, guild_id: GuildId, session_id: SessionId) -> bool {
        self.sessions
            .get(&guild_id)
            .map(|s| s.id() == session_id)
            .unwrap_or(false)
    }

    fn close(&self, guild_id: GuildId) -> Option<VoiceSession> {
        self.sessions.remove(&guild_id).map(|(_, session)| {
            tracing::info!(
                guild_id = %guild_id,
                session_id = %session.id(),
                state = %session.state(),
                track = ?session.track().map(|t| t.to_string()),
                duration_ms = (Utc::now() - session.created_at()).num_milliseconds(),
                "Session closed"
            );
            session
        })
    }
}
