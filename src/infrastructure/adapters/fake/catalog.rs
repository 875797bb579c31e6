//! Fake Catalog - 内存曲库
//!
//! 按查询词返回预设曲目，不访问网络

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{CatalogError, CatalogPort};
use crate::domain::catalog::Track;

/// Fake Catalog
#[derive(Default)]
pub struct FakeCatalog {
    tracks: Mutex<HashMap<String, Track>>,
    /// 没有命中时的兜底结果
    fallback: Mutex<Option<Track>>,
    /// 模拟网络延迟
    latency: Option<Duration>,
    /// 置位时所有检索都失败
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对任意查询都返回同一首曲目
    pub fn always(track: Track) -> Self {
        let catalog = Self::default();
        *catalog.fallback.lock().unwrap() = Some(track);
        catalog
    }

    pub fn with_track(self, query: impl Into<String>, track: Track) -> Self {
        self.tracks.lock().unwrap().insert(query.into(), track);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// 已收到的查询，按调用顺序
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogPort for FakeCatalog {
    async fn search(&self, query: &str) -> Result<Option<Track>, CatalogError> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(CatalogError::ServiceError(message));
        }

        let hit = self.tracks.lock().unwrap().get(query).cloned();
        Ok(hit.or_else(|| self.fallback.lock().unwrap().clone()))
    }
}
