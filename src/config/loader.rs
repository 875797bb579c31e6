//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.local.* / config.*，toml 或 json）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径，后者覆盖前者
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `CADENZA_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `CADENZA_DISCORD__TOKEN=...`
/// - `CADENZA_SPOTIFY__CLIENT_ID=...`
/// - `CADENZA_SPOTIFY__CLIENT_SECRET=...`
/// - `CADENZA_PLAYBACK__MAX_RETRIES=5`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("discord.command_prefix", "!")?
        .set_default("spotify.api_base", "https://api.spotify.com")?
        .set_default("spotify.accounts_base", "https://accounts.spotify.com")?
        .set_default("spotify.timeout_secs", 15)?
        .set_default("spotify.token_refresh_margin_secs", 60)?
        .set_default("resolver.query_suffix", "official audio")?
        .set_default("playback.retry_delay_secs", 5)?
        .set_default("playback.max_retries", 3)?
        .set_default("playback.test_file", "assets/sample.mp3")?
        .set_default("playback.volume", 1.0)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: CADENZA_SPOTIFY__MARKET=SE
    builder = builder.add_source(
        Environment::with_prefix("CADENZA")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.discord.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Discord token cannot be empty".to_string(),
        ));
    }

    if config.discord.command_prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "Command prefix cannot be empty".to_string(),
        ));
    }

    if config.spotify.client_id.trim().is_empty() || config.spotify.client_secret.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Spotify client id and secret are required".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.playback.volume) {
        return Err(ConfigError::ValidationError(format!(
            "Playback volume must be within 0.0..=2.0, got {}",
            config.playback.volume
        )));
    }

    Ok(())
}

/// 只保留前 4 个字符
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Discord Token: {}", mask(&config.discord.token));
    tracing::info!("Command Prefix: {}", config.discord.command_prefix);
    tracing::info!("Spotify Client ID: {}", mask(&config.spotify.client_id));
    tracing::info!("Spotify Client Secret: {}", mask(&config.spotify.client_secret));
    tracing::info!("Spotify API: {}", config.spotify.api_base);
    if let Some(market) = &config.spotify.market {
        tracing::info!("Spotify Market: {}", market);
    }
    tracing::info!("Resolver Query Suffix: {:?}", config.resolver.query_suffix);
    tracing::info!(
        "Retry: {} attempt(s), {}s delay",
        config.playback.max_retries,
        config.playback.retry_delay_secs
    );
    tracing::info!("Test File: {:?}", config.playback.test_file);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.discord.token = "bot-token".to_string();
        config.spotify.client_id = "client-id".to_string();
        config.spotify.client_secret = "client-secret".to_string();
        config
    }

    fn write_config(extension: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_missing_token() {
        let config = AppConfig {
            discord: Default::default(),
            ..valid_config()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_missing_spotify_secret() {
        let mut config = valid_config();
        config.spotify.client_secret = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_prefix() {
        let mut config = valid_config();
        config.discord.command_prefix = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_volume_out_of_range() {
        let mut config = valid_config();
        config.playback.volume = 2.5;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_mask_hides_secret() {
        assert_eq!(mask("abcdefgh"), "abcd****");
        assert_eq!(mask(""), "<unset>");
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(
            ".toml",
            r#"
[discord]
token = "file-token"

[spotify]
client_id = "file-id"
client_secret = "file-secret"
market = "SE"

[playback]
retry_delay_secs = 2
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();

        assert_eq!(config.discord.token, "file-token");
        assert_eq!(config.spotify.market.as_deref(), Some("SE"));
        assert_eq!(config.playback.retry_delay_secs, 2);
        // 未出现的键使用默认值
        assert_eq!(config.spotify.accounts_base, "https://accounts.spotify.com");
        assert_eq!(config.resolver.query_suffix, "official audio");
    }

    #[test]
    fn test_load_json_file() {
        let file = write_config(
            ".json",
            r#"{"discord": {"token": "json-token"},
               "spotify": {"client_id": "id", "client_secret": "secret"},
               "playback": {"volume": 0.5}}"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.discord.token, "json-token");
        assert_eq!(config.playback.volume, 0.5);
    }

    #[test]
    fn test_file_missing_credentials_is_rejected() {
        let file = write_config(".toml", "[discord]\ntoken = \"only-token\"\n");

        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(
            ".toml",
            r#"
[discord]
token = "file-token"

[spotify]
client_id = "id"
client_secret = "secret"
token_refresh_margin_secs = 10
"#,
        );

        std::env::set_var("CADENZA_SPOTIFY__TOKEN_REFRESH_MARGIN_SECS", "90");
        let result = load_config_from_path(Some(file.path()));
        std::env::remove_var("CADENZA_SPOTIFY__TOKEN_REFRESH_MARGIN_SECS");

        assert_eq!(result.unwrap().spotify.token_refresh_margin_secs, 90);
    }
}
