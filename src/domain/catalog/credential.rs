//! Catalog Context - 访问凭证租约

use chrono::{DateTime, Duration, Utc};

/// 曲库访问凭证
///
/// 不变量:
/// - 进程内共享，不持久化
/// - 每次曲库调用前惰性检查是否过期，过期则按需刷新
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// 从签发时间和有效期（秒）构建
    pub fn issued_at(access_token: impl Into<String>, now: DateTime<Utc>, expires_in_secs: u64) -> Self {
        let ttl = Duration::seconds(expires_in_secs.min(u64::from(u32::MAX)) as i64);
        Self::new(access_token, now + ttl)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// 在 `margin` 的提前量内即视为过期
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_credential_not_expired() {
        let now = Utc::now();
        let credential = Credential::issued_at("token", now, 3600);
        assert!(!credential.is_expired(now, Duration::seconds(60)));
    }

    #[test]
    fn test_credential_expires_within_margin() {
        let now = Utc::now();
        let credential = Credential::issued_at("token", now, 30);
        assert!(credential.is_expired(now, Duration::seconds(60)));
        assert!(!credential.is_expired(now, Duration::zero()));
    }

    #[test]
    fn test_debug_masks_token() {
        let credential = Credential::issued_at("super-secret", Utc::now(), 3600);
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret"));
    }
}
