use clap::Parser;
use registry_stats_bot::adapters::telegram::TelegramClient;
use registry_stats_bot::adapters::webhook::build_router;
use registry_stats_bot::utils::error::ErrorSeverity;
use registry_stats_bot::utils::logger;
use registry_stats_bot::utils::validation::{mask_secret, Validate};
use registry_stats_bot::{
    Aggregator, BotConfig, BotError, CatalogConfig, CommandDispatcher, CredentialStore,
    HttpCountSource,
};
use std::sync::Arc;

fn exit_with(e: &BotError) -> ! {
    tracing::error!(
        "❌ Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在時忽略
    dotenv::dotenv().ok();

    let config = BotConfig::parse();
    logger::init_logger(config.verbose, config.log_json);
    let config = config.normalized();

    tracing::info!("🚀 Starting registry-stats-bot");

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let catalog = match CatalogConfig::load(config.catalog.as_deref())
        .and_then(CatalogConfig::into_descriptors)
    {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => exit_with(&e),
    };
    tracing::info!("✅ Catalog loaded with {} categories", catalog.len());

    let credential = Arc::new(CredentialStore::new(&config.bearer_token, config.admin_id()));
    if credential.get().is_empty() {
        tracing::warn!("BEARER_TOKEN is empty, registry calls will be sent without Authorization");
    }

    let source = HttpCountSource::new(Arc::clone(&credential), config.request_timeout());
    let aggregator =
        Aggregator::new(Arc::new(source)).with_call_timeout(config.request_timeout());

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_api_base,
        &config.bot_token,
    ));

    let secret_path = config.secret_path();
    let mut dispatcher = CommandDispatcher::new(telegram.clone(), aggregator, credential, catalog)
        .with_webhook_info(&config.webhook_base_url, &secret_path);

    // 取不到帳號時 /cmd@任何bot 都會被處理
    match telegram.get_me().await {
        Ok(me) => match me.username {
            Some(username) => {
                tracing::info!("🤖 Running as @{}", username);
                dispatcher = dispatcher.with_bot_username(&username);
            }
            None => tracing::warn!("getMe returned no username"),
        },
        Err(e) => tracing::warn!("⚠️ getMe failed, @bot suffixes will not be checked: {}", e),
    }
    let dispatcher = Arc::new(dispatcher);

    match config.webhook_url() {
        Some(url) => {
            tracing::info!("Setting webhook for path /{}", mask_secret(&secret_path));
            if let Err(e) = telegram.set_webhook(&url).await {
                tracing::error!("❌ setWebhook failed: {}", e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            }
        }
        None => {
            tracing::warn!("WEBHOOK_BASE_URL missing or invalid, setWebhook skipped");
        }
    }

    let router = build_router(dispatcher, &secret_path);
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!("📡 Listening on {}", config.listen_addr());

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
