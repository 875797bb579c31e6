//! Playback Context - Aggregate Root

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{
    ChannelId, GuildId, PlaybackError, PlaybackRequest, ReplyTarget, SessionId, SessionState,
};
use crate::domain::catalog::Track;

/// 重试策略
///
/// 只由播放器错误触发；每次重试都从 Searching 重新走完整流程
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

/// 播放出错后的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// 进入 Retrying，这是第 `retry` 次重试
    Retry { retry: u32 },
    /// 重试次数用尽，进入 Disconnected
    GiveUp { attempts: u32 },
}

/// VoiceSession 聚合根
///
/// 不变量:
/// - 同一 guild 同时最多一个会话（由注册表保证）
/// - 状态只能沿 `SessionState::can_transition_to` 迁移
/// - attempt_count 从 1 开始，每次重试加一
#[derive(Debug, Clone)]
pub struct VoiceSession {
    id: SessionId,
    guild_id: GuildId,
    channel_id: ChannelId,
    reply_to: ReplyTarget,
    request: PlaybackRequest,
    state: SessionState,
    attempt_count: u32,
    track: Option<Track>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VoiceSession {
    pub fn new(
        guild_id: GuildId,
        channel_id: ChannelId,
        reply_to: ReplyTarget,
        request: PlaybackRequest,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            guild_id,
            channel_id,
            reply_to,
            request,
            state: SessionState::Idle,
            attempt_count: 1,
            track: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 状态迁移
    pub fn transition(&mut self, next: SessionState) -> Result<SessionState, PlaybackError> {
        if self.state == SessionState::Disconnected {
            return Err(PlaybackError::Finished(self.state));
        }
        if !self.state.can_transition_to(next) {
            return Err(PlaybackError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        let previous = self.state;
        self.state = next;
        self.updated_at = Utc::now();
        Ok(previous)
    }

    /// 播放器报错：Playing → Retrying，或在次数用尽时 → Disconnected
    pub fn on_player_error(&mut self, policy: &RetryPolicy) -> Result<RetryDecision, PlaybackError> {
        let retries_used = self.attempt_count.saturating_sub(1);
        if self.request.is_test_file() || retries_used >= policy.max_retries {
            self.transition(SessionState::Disconnected)?;
            return Ok(RetryDecision::GiveUp {
                attempts: self.attempt_count,
            });
        }

        self.transition(SessionState::Retrying)?;
        self.attempt_count += 1;
        self.track = None;
        Ok(RetryDecision::Retry {
            retry: retries_used + 1,
        })
    }

    pub fn record_track(&mut self, track: Track) {
        self.track = Some(track);
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn reply_to(&self) -> ReplyTarget {
        self.reply_to
    }

    pub fn request(&self) -> &PlaybackRequest {
        &self.request
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::MessageId;

    fn session(request: PlaybackRequest) -> VoiceSession {
        VoiceSession::new(
            GuildId::new(1),
            ChannelId::new(2),
            ReplyTarget::new(ChannelId::new(3), MessageId::new(4)),
            request,
        )
    }

    fn playing(request: PlaybackRequest) -> VoiceSession {
        let mut session = session(request);
        for state in [
            SessionState::Searching,
            SessionState::Resolving,
            SessionState::Connecting,
            SessionState::Playing,
        ] {
            session.transition(state).unwrap();
        }
        session
    }

    #[test]
    fn test_new_session_is_idle_first_attempt() {
        let session = session(PlaybackRequest::Query("Imagine".into()));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.attempt_count(), 1);
        assert!(session.track().is_none());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut session = session(PlaybackRequest::Query("Imagine".into()));
        let err = session.transition(SessionState::Playing).unwrap_err();
        assert_eq!(
            err,
            PlaybackError::InvalidTransition {
                from: SessionState::Idle,
                to: SessionState::Playing
            }
        );
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_player_error_retries_until_bound() {
        let policy = RetryPolicy {
            delay: Duration::from_secs(5),
            max_retries: 2,
        };
        let mut session = playing(PlaybackRequest::Query("Imagine".into()));

        assert_eq!(
            session.on_player_error(&policy).unwrap(),
            RetryDecision::Retry { retry: 1 }
        );
        assert_eq!(session.state(), SessionState::Retrying);
        assert_eq!(session.attempt_count(), 2);

        for state in [
            SessionState::Searching,
            SessionState::Resolving,
            SessionState::Connecting,
            SessionState::Playing,
        ] {
            session.transition(state).unwrap();
        }
        assert_eq!(
            session.on_player_error(&policy).unwrap(),
            RetryDecision::Retry { retry: 2 }
        );

        for state in [
            SessionState::Searching,
            SessionState::Resolving,
            SessionState::Connecting,
            SessionState::Playing,
        ] {
            session.transition(state).unwrap();
        }
        assert_eq!(
            session.on_player_error(&policy).unwrap(),
            RetryDecision::GiveUp { attempts: 3 }
        );
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_zero_retries_gives_up_immediately() {
        let policy = RetryPolicy {
            delay: Duration::from_secs(5),
            max_retries: 0,
        };
        let mut session = playing(PlaybackRequest::Query("Imagine".into()));
        assert_eq!(
            session.on_player_error(&policy).unwrap(),
            RetryDecision::GiveUp { attempts: 1 }
        );
    }

    #[test]
    fn test_test_file_never_retries() {
        let mut session = session(PlaybackRequest::TestFile("assets/sample.mp3".into()));
        session.transition(SessionState::Connecting).unwrap();
        session.transition(SessionState::Playing).unwrap();
        assert_eq!(
            session.on_player_error(&RetryPolicy::default()).unwrap(),
            RetryDecision::GiveUp { attempts: 1 }
        );
    }

    #[test]
    fn test_disconnected_is_final() {
        let mut session = session(PlaybackRequest::Query("Imagine".into()));
        session.transition(SessionState::Disconnected).unwrap();
        assert_eq!(
            session.transition(SessionState::Searching).unwrap_err(),
            PlaybackError::Finished(SessionState::Disconnected)
        );
    }
}
