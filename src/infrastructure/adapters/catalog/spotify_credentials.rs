//! Spotify Credential Provider - client-credentials 授权
//!
//! 外部 API:
//! POST {accounts_base}/api/token
//! Request: grant_type=client_credentials (form), HTTP basic auth (client id / secret)
//! Response: {"access_token": "...", "token_type": "Bearer", "expires_in": 3600}
//!
//! 凭证是惰性租约：每次取 token 时检查是否过期，过期才刷新，没有后台定时器

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::{CatalogError, CredentialProviderPort};
use crate::domain::catalog::Credential;

/// token 接口响应
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// 凭证配置
#[derive(Debug, Clone)]
pub struct SpotifyCredentialsConfig {
    /// 授权服务基础 URL
    pub accounts_base: String,
    pub client_id: String,
    pub client_secret: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 提前刷新的余量（秒）
    pub refresh_margin_secs: u64,
}

impl Default for SpotifyCredentialsConfig {
    fn default() -> Self {
        Self {
            accounts_base: "https://accounts.spotify.com".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: 15,
            refresh_margin_secs: 60,
        }
    }
}

impl SpotifyCredentialsConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Default::default()
        }
    }

    pub fn with_accounts_base(mut self, base: impl Into<String>) -> Self {
        self.accounts_base = base.into();
        self
    }

    pub fn with_refresh_margin(mut self, secs: u64) -> Self {
        self.refresh_margin_secs = secs;
        self
    }
}

/// Spotify 凭证提供者
pub struct SpotifyCredentialProvider {
    client: Client,
    config: SpotifyCredentialsConfig,
    /// 当前租约；锁同时保证同一时刻只有一个刷新请求
    lease: Mutex<Option<Credential>>,
}

impl SpotifyCredentialProvider {
    pub fn new(config: SpotifyCredentialsConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            lease: Mutex::new(None),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.config.accounts_base.trim_end_matches('/'))
    }

    fn margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.refresh_margin_secs.min(u64::from(u32::MAX)) as i64)
    }

    /// 执行 client-credentials 授权
    async fn request_token(&self) -> Result<Credential, CatalogError> {
        tracing::debug!(url = %self.token_url(), "Requesting catalog access token");

        let response = self
            .client
            .post(self.token_url())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else if e.is_connect() {
                    CatalogError::NetworkError(format!("Cannot connect to accounts service: {}", e))
                } else {
                    CatalogError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CatalogError::AuthError(format!("HTTP {}: {}", status, error_text))
                }
                _ => CatalogError::ServiceError(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse token: {}", e)))?;

        Ok(Credential::issued_at(body.access_token, Utc::now(), body.expires_in))
    }
}

#[async_trait]
impl CredentialProviderPort for SpotifyCredentialProvider {
    async fn token(&self) -> Result<String, CatalogError> {
        let mut lease = self.lease.lock().await;

        if let Some(credential) = lease.as_ref() {
            if !credential.is_expired(Utc::now(), self.margin()) {
                return Ok(credential.access_token().to_string());
            }
        }

        match self.request_token().await {
            Ok(credential) => {
                tracing::info!(expires_at = %credential.expires_at(), "Catalog access token refreshed");
                let token = credential.access_token().to_string();
                *lease = Some(credential);
                Ok(token)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error retrieving catalog access token");
                *lease = None;
                Err(e)
            }
        }
    }

    async fn invalidate(&self) {
        self.lease.lock().await.take();
    }
}
