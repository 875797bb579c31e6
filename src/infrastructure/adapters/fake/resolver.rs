//! Fake Stream Resolver

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{ResolverError, StreamResolverPort};
use crate::domain::catalog::Track;
use crate::domain::playback::StreamSource;

/// 解析行为
#[derive(Debug, Clone)]
enum Behaviour {
    /// 根据曲目生成一个检索 URL
    Derive,
    /// 固定返回
    Fixed(Option<StreamSource>),
    /// 返回错误
    Fail(String),
}

/// Fake Stream Resolver
pub struct FakeResolver {
    behaviour: Behaviour,
    resolved: Mutex<Vec<Track>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            behaviour: Behaviour::Derive,
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(source: Option<StreamSource>) -> Self {
        Self {
            behaviour: Behaviour::Fixed(source),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Fail(message.into()),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn resolved(&self) -> Vec<Track> {
        self.resolved.lock().unwrap().clone()
    }
}

impl Default for FakeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamResolverPort for FakeResolver {
    async fn resolve(&self, track: &Track) -> Result<Option<StreamSource>, ResolverError> {
        self.resolved.lock().unwrap().push(track.clone());

        match &self.behaviour {
            Behaviour::Derive => {
                let slug = track.search_terms().replace(' ', "+");
                Ok(Some(
                    StreamSource::url(format!("https://fake.invalid/watch?q={}", slug))
                        .with_title(track.title()),
                ))
            }
            Behaviour::Fixed(source) => Ok(source.clone()),
            Behaviour::Fail(message) => Err(ResolverError::Failed(message.clone())),
        }
    }
}
