//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::playback::RetryPolicy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Discord 机器人配置
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Spotify 曲库配置
    #[serde(default)]
    pub spotify: SpotifyConfig,

    /// 音源解析配置
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// Discord 配置
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// 机器人登录 token
    #[serde(default)]
    pub token: String,

    /// 命令前缀
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            command_prefix: default_command_prefix(),
        }
    }
}

/// Spotify 配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// 与凭证一起下发的回调地址，client-credentials 授权不使用
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Web API 基础 URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// 授权服务基础 URL
    #[serde(default = "default_accounts_base")]
    pub accounts_base: String,

    /// 检索市场（ISO 3166-1 alpha-2）
    #[serde(default)]
    pub market: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_spotify_timeout")]
    pub timeout_secs: u64,

    /// token 提前刷新的余量（秒）
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_secs: u64,
}

fn default_api_base() -> String {
    "https://api.spotify.com".to_string()
}

fn default_accounts_base() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_spotify_timeout() -> u64 {
    15
}

fn default_refresh_margin() -> u64 {
    60
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: None,
            api_base: default_api_base(),
            accounts_base: default_accounts_base(),
            market: None,
            timeout_secs: default_spotify_timeout(),
            token_refresh_margin_secs: default_refresh_margin(),
        }
    }
}

/// 音源解析配置
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// 追加到视频站查询词末尾
    #[serde(default = "default_query_suffix")]
    pub query_suffix: String,

    /// yt-dlp 格式选择（-f），为空时使用 yt-dlp 默认值
    #[serde(default = "default_format")]
    pub format: Option<String>,
}

fn default_query_suffix() -> String {
    "official audio".to_string()
}

fn default_format() -> Option<String> {
    Some("bestaudio[ext=webm]/bestaudio/best".to_string())
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_suffix: default_query_suffix(),
            format: default_format(),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 播放出错后重试前的等待时间（秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// 最大重试次数，0 表示不重试
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// `test` 命令播放的本地文件
    #[serde(default = "default_test_file")]
    pub test_file: PathBuf,

    /// 播放音量（0.0 - 2.0）
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_retry_delay() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_test_file() -> PathBuf {
    PathBuf::from("assets/sample.mp3")
}

fn default_volume() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay(),
            max_retries: default_max_retries(),
            test_file: default_test_file(),
            volume: default_volume(),
        }
    }
}

impl PlaybackConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_secs(self.retry_delay_secs),
            max_retries: self.max_retries,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
