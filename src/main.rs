//! Cadenza - Discord 音乐机器人
//!
//! `!play <query>`: Spotify 检索 → yt-dlp 解析 → songbird 播放

use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use songbird::Songbird;

use cadenza::config::{load_config, print_config, AppConfig};
use cadenza::infrastructure::adapters::{
    SongbirdGatewayConfig, SpotifyCatalog, SpotifyCatalogConfig, SpotifyCredentialProvider,
    SpotifyCredentialsConfig, YtDlpResolver, YtDlpResolverConfig,
};
use cadenza::infrastructure::discord::{BotServices, DiscordHandler};
use cadenza::infrastructure::memory::InMemorySessionRegistry;
use cadenza::infrastructure::worker::SessionWorkerConfig;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},cadenza={},serenity=warn,songbird=warn",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Cadenza - Discord music bot");
    print_config(&config);

    if !config.playback.test_file.exists() {
        tracing::warn!(path = ?config.playback.test_file, "Test file not found, !test will fail");
    }

    // 曲库：凭证租约 + 检索客户端
    let credentials_config = SpotifyCredentialsConfig {
        accounts_base: config.spotify.accounts_base.clone(),
        client_id: config.spotify.client_id.clone(),
        client_secret: config.spotify.client_secret.clone(),
        timeout_secs: config.spotify.timeout_secs,
        refresh_margin_secs: config.spotify.token_refresh_margin_secs,
    };
    let credentials = Arc::new(SpotifyCredentialProvider::new(credentials_config)?);

    let catalog_config = SpotifyCatalogConfig {
        api_base: config.spotify.api_base.clone(),
        market: config.spotify.market.clone(),
        timeout_secs: config.spotify.timeout_secs,
    };
    let catalog = Arc::new(SpotifyCatalog::new(catalog_config, credentials)?);

    // yt-dlp 与 songbird 共用一个 HTTP 客户端
    let http_client = reqwest::Client::new();
    let resolver = Arc::new(YtDlpResolver::new(
        http_client.clone(),
        YtDlpResolverConfig {
            query_suffix: config.resolver.query_suffix.clone(),
        },
    ));

    let registry = Arc::new(InMemorySessionRegistry::new());
    let songbird = Songbird::serenity();

    let services = BotServices {
        registry,
        catalog,
        resolver,
        songbird: songbird.clone(),
        http_client,
        worker: SessionWorkerConfig {
            retry: config.playback.retry_policy(),
            command_prefix: config.discord.command_prefix.clone(),
        },
        gateway: SongbirdGatewayConfig {
            volume: config.playback.volume,
            format: config
                .resolver
                .format
                .clone()
                .filter(|format| !format.trim().is_empty()),
        },
        test_file: config.playback.test_file.clone(),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(DiscordHandler::new(services))
        .voice_manager_arc(songbird)
        .await?;

    // ctrl-c 时关闭所有分片
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        tracing::info!("Received shutdown signal");
        shard_manager.shutdown_all().await;
    });

    tracing::info!("Connecting to Discord gateway...");
    client.start().await?;

    tracing::info!("Bot shutdown complete");

    Ok(())
}
