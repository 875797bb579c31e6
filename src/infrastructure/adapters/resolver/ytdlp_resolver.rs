//! yt-dlp Stream Resolver - 在视频站上检索曲目
//!
//! 通过 songbird 的 `YoutubeDl` 搜索输入调用 yt-dlp，
//! 查询词为 "<标题> <第一位艺术家> <后缀>"，只取第一条结果的页面 URL

use async_trait::async_trait;
use reqwest::Client;
use songbird::input::{AudioStreamError, YoutubeDl};

use crate::application::ports::{ResolverError, StreamResolverPort};
use crate::domain::catalog::Track;
use crate::domain::playback::StreamSource;

/// 解析器配置
#[derive(Debug, Clone)]
pub struct YtDlpResolverConfig {
    /// 追加在查询词末尾，偏向官方音频
    pub query_suffix: String,
}

impl Default for YtDlpResolverConfig {
    fn default() -> Self {
        Self {
            query_suffix: "official audio".to_string(),
        }
    }
}

/// yt-dlp 解析器
pub struct YtDlpResolver {
    client: Client,
    config: YtDlpResolverConfig,
}

impl YtDlpResolver {
    pub fn new(client: Client, config: YtDlpResolverConfig) -> Self {
        Self { client, config }
    }

    /// 构造搜索查询词
    pub fn search_query(&self, track: &Track) -> String {
        let terms = track.search_terms();
        let suffix = self.config.query_suffix.trim();
        if suffix.is_empty() {
            terms
        } else {
            format!("{} {}", terms, suffix)
        }
    }
}

#[async_trait]
impl StreamResolverPort for YtDlpResolver {
    async fn resolve(&self, track: &Track) -> Result<Option<StreamSource>, ResolverError> {
        let query = self.search_query(track);
        tracing::debug!(query = %query, "Searching stream source");

        let mut search = YoutubeDl::new_search(self.client.clone(), query.clone());
        let results = search.search(Some(1)).await.map_err(|e| match e {
            AudioStreamError::Fail(err) => ResolverError::Failed(err.to_string()),
            other => ResolverError::Unavailable(other.to_string()),
        })?;

        let source = results.into_iter().next().and_then(|meta| {
            let url = meta.source_url?;
            let title = meta.title.unwrap_or_else(|| track.title().to_string());
            Some(StreamSource::url(url).with_title(title))
        });

        if source.is_none() {
            tracing::info!(query = %query, "No stream source found");
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_uses_title_first_artist_and_suffix() {
        let resolver = YtDlpResolver::new(Client::new(), YtDlpResolverConfig::default());
        let track = Track::new(
            "Under Pressure",
            vec!["Queen".to_string(), "David Bowie".to_string()],
        );

        assert_eq!(resolver.search_query(&track), "Under Pressure Queen official audio");
    }

    #[test]
    fn test_blank_suffix_is_omitted() {
        let resolver = YtDlpResolver::new(
            Client::new(),
            YtDlpResolverConfig {
                query_suffix: "  ".to_string(),
            },
        );
        let track = Track::new("Imagine", vec!["John Lennon".to_string()]);

        assert_eq!(resolver.search_query(&track), "Imagine John Lennon");
    }
}
