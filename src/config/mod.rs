pub mod catalog;

use crate::adapters::telegram::DEFAULT_API_BASE;
use crate::utils::error::Result;
use crate::utils::validation::{
    sanitize_printable, validate_non_empty_string, validate_path_segment, validate_range,
    validate_url, Validate,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "registry-stats-bot")]
#[command(about = "Telegram bot reporting civil-registry record counts")]
pub struct BotConfig {
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true, default_value = "")]
    pub bot_token: String,

    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub listen_host: String,

    #[arg(long, env = "WEBHOOK_BASE_URL", default_value = "")]
    pub webhook_base_url: String,

    #[arg(long, env = "WEBHOOK_SECRET_PATH", hide_env_values = true)]
    pub webhook_secret_path: Option<String>,

    /// 戶籍系統 API 的初始 bearer token
    #[arg(long, env = "BEARER_TOKEN", hide_env_values = true, default_value = "")]
    pub bearer_token: String,

    /// 0 表示不限制誰能使用 /settoken
    #[arg(long, env = "ADMIN_USER_ID", default_value = "0")]
    pub admin_user_id: i64,

    /// 自訂 catalog (TOML)，未指定時使用內建清單
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog: Option<PathBuf>,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "8")]
    pub request_timeout_secs: u64,

    #[arg(long, env = "TELEGRAM_API_BASE", default_value = DEFAULT_API_BASE)]
    pub telegram_api_base: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, env = "LOG_JSON", help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl BotConfig {
    /// 清理從環境變數讀進來的值 (不可見字元、結尾斜線、本機 webhook)
    pub fn normalized(mut self) -> Self {
        self.bot_token = sanitize_printable(&self.bot_token);
        self.bearer_token = sanitize_printable(&self.bearer_token);
        self.webhook_secret_path = self
            .webhook_secret_path
            .as_deref()
            .map(sanitize_printable)
            .filter(|path| !path.is_empty());

        let base = sanitize_printable(&self.webhook_base_url)
            .trim_end_matches('/')
            .to_string();
        let lower = base.to_lowercase();
        self.webhook_base_url = if lower.starts_with("http://localhost")
            || lower.starts_with("http://127.0.0.1")
        {
            tracing::warn!("WEBHOOK_BASE_URL points at localhost, webhook registration will be skipped");
            String::new()
        } else {
            if !base.is_empty() && !lower.starts_with("https://") {
                tracing::warn!("WEBHOOK_BASE_URL should be a public HTTPS URL, got: {}", base);
            }
            base
        };

        self
    }

    /// 接收 update 的 URL path；未設定時由 bot token 推導
    pub fn secret_path(&self) -> String {
        match &self.webhook_secret_path {
            Some(path) => path.clone(),
            None if self.bot_token.is_empty() => "hook-tg".to_string(),
            None => format!("hook-{}", self.bot_token.replace(':', "-")),
        }
    }

    pub fn webhook_url(&self) -> Option<String> {
        if self.webhook_base_url.is_empty() {
            None
        } else {
            Some(format!("{}/{}", self.webhook_base_url, self.secret_path()))
        }
    }

    pub fn admin_id(&self) -> Option<i64> {
        Some(self.admin_user_id).filter(|id| *id != 0)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.port)
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("bot_token", &self.bot_token)?;
        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 60)?;
        validate_path_segment("webhook_secret_path", &self.secret_path())?;
        validate_url("telegram_api_base", &self.telegram_api_base)?;

        if !self.webhook_base_url.is_empty() {
            validate_url("webhook_base_url", &self.webhook_base_url)?;
        }

        if self.webhook_secret_path.is_none() {
            tracing::warn!(
                "WEBHOOK_SECRET_PATH not set, deriving it from the bot token; set an independent secret"
            );
        }
        Ok(())
    }
}
