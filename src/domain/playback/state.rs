//! Playback Context - 会话状态机

/// 语音会话状态
///
/// ```text
/// Idle → Searching → Resolving → Connecting → Playing → Idle
///                                               │
///                                               ├─error→ Retrying ─delay→ Searching
///                                               │            └─exhausted→ Disconnected
///                  (任意非终态) ──stop / 失败──────→ Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// 无活动（会话尚未开始，或播放正常结束）
    Idle,
    /// 正在向曲库检索
    Searching,
    /// 正在解析可播放音源
    Resolving,
    /// 正在加入语音频道
    Connecting,
    /// 正在播放
    Playing,
    /// 播放出错，等待重试
    Retrying,
    /// 本次尝试终止
    Disconnected,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Searching => "searching",
            SessionState::Resolving => "resolving",
            SessionState::Connecting => "connecting",
            SessionState::Playing => "playing",
            SessionState::Retrying => "retrying",
            SessionState::Disconnected => "disconnected",
        }
    }

    /// 会话在终态时从注册表移除
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Disconnected)
    }

    /// 是否已经（或正在）持有语音连接
    pub fn holds_connection(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Playing)
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        if next == Disconnected {
            return *self != Disconnected;
        }

        matches!(
            (self, next),
            (Idle, Searching)
                | (Idle, Connecting)
                | (Searching, Resolving)
                | (Resolving, Connecting)
                | (Connecting, Playing)
                | (Playing, Idle)
                | (Playing, Retrying)
                | (Retrying, Searching)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use SessionState::*;
        let path = [Idle, Searching, Resolving, Connecting, Playing, Idle];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_retry_loops_back_to_searching() {
        use SessionState::*;
        assert!(Playing.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Searching));
        assert!(!Retrying.can_transition_to(Playing));
    }

    #[test]
    fn test_skipping_phases_rejected() {
        use SessionState::*;
        assert!(!Searching.can_transition_to(Playing));
        assert!(!Resolving.can_transition_to(Playing));
        assert!(!Idle.can_transition_to(Playing));
        assert!(!Searching.can_transition_to(Retrying));
    }

    #[test]
    fn test_any_live_state_can_disconnect() {
        use SessionState::*;
        for state in [Idle, Searching, Resolving, Connecting, Playing, Retrying] {
            assert!(state.can_transition_to(Disconnected));
        }
        assert!(!Disconnected.can_transition_to(Disconnected));
        assert!(!Disconnected.can_transition_to(Searching));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Retrying.to_string(), "retrying");
        assert_eq!(SessionState::Connecting.as_str(), "connecting");
    }
}
