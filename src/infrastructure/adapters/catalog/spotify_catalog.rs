//! Spotify Catalog - 曲目检索
//!
//! 外部 API:
//! GET {api_base}/v1/search?q=<query>&type=track&limit=1[&market=XX]
//! Authorization: Bearer <token>
//! Response: {"tracks": {"items": [{"name": "...", "artists": [{"name": "..."}]}]}}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{CatalogError, CatalogPort, CredentialProviderPort};
use crate::domain::catalog::Track;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

impl SearchResponse {
    /// 只取第一条结果
    fn into_first_track(self) -> Option<Track> {
        self.tracks.items.into_iter().next().map(|item| {
            Track::new(
                item.name,
                item.artists.into_iter().map(|a| a.name).collect(),
            )
        })
    }
}

/// 曲库客户端配置
#[derive(Debug, Clone)]
pub struct SpotifyCatalogConfig {
    /// Web API 基础 URL
    pub api_base: String,
    /// 市场代码（ISO 3166-1 alpha-2），为空时由服务端决定
    pub market: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for SpotifyCatalogConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.spotify.com".to_string(),
            market: None,
            timeout_secs: 15,
        }
    }
}

impl SpotifyCatalogConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Default::default()
        }
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Spotify 曲库客户端
pub struct SpotifyCatalog {
    client: Client,
    config: SpotifyCatalogConfig,
    credentials: Arc<dyn CredentialProviderPort>,
}

impl SpotifyCatalog {
    pub fn new(
        config: SpotifyCatalogConfig,
        credentials: Arc<dyn CredentialProviderPort>,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/v1/search", self.config.api_base.trim_end_matches('/'))
    }

    fn search_params<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("q", query), ("type", "track"), ("limit", "1")];
        if let Some(market) = self.config.market.as_deref() {
            params.push(("market", market));
        }
        params
    }
}

#[async_trait]
impl CatalogPort for SpotifyCatalog {
    async fn search(&self, query: &str) -> Result<Option<Track>, CatalogError> {
        let token = self.credentials.token().await?;

        tracing::debug!(url = %self.search_url(), query = %query, "Sending catalog search request");

        let response = self
            .client
            .get(self.search_url())
            .bearer_auth(token)
            .query(&self.search_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else if e.is_connect() {
                    CatalogError::NetworkError(format!("Cannot connect to catalog service: {}", e))
                } else {
                    CatalogError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // 凭证被服务端拒绝，下一次调用重新授权
            self.credentials.invalidate().await;
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::AuthError(format!("HTTP {}: {}", status, error_text)));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse search: {}", e)))?;

        let track = body.into_first_track();
        if track.is_none() {
            tracing::info!(query = %query, "Catalog search returned no tracks");
        }
        Ok(track)
    }
}
