use crate::app::presentation::{self, StatusView};
use crate::core::aggregator::Aggregator;
use crate::core::credential::CredentialStore;
use crate::domain::model::RequestDescriptor;
use crate::domain::ports::ChatTransport;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::mask_secret;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Ping,
    Report,
    /// 參數以單一空白重新串接，尚未清理
    SetCredential(String),
    Status,
    Unknown(String),
}

impl Command {
    /// 解析 `/name@bot arg1 arg2`；不是指令的訊息回傳 `None`
    ///
    /// 已知 bot 帳號時，`@` 後面指名其他 bot 的指令也回傳 `None`
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let (name, addressee) = match head.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (head, None),
        };
        if let (Some(addressee), Some(own)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return None;
            }
        }
        let name = name.to_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "start" => Command::Start,
            "ping" => Command::Ping,
            "thongke" | "report" => Command::Report,
            "settoken" | "set_credential" => Command::SetCredential(args.join(" ")),
            "status" => Command::Status,
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

/// 從聊天平台收到的一則指令
#[derive(Debug, Clone)]
pub struct IncomingCommand {
    pub chat_id: i64,
    /// 平台沒有提供發送者時為 0
    pub requester_id: i64,
    pub text: String,
}

/// 把指令對應到核心操作並回覆到同一個聊天室
pub struct CommandDispatcher {
    transport: Arc<dyn ChatTransport>,
    aggregator: Aggregator,
    credential: Arc<CredentialStore>,
    catalog: Arc<Vec<RequestDescriptor>>,
    webhook_base_url: String,
    secret_path: String,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        aggregator: Aggregator,
        credential: Arc<CredentialStore>,
        catalog: Arc<Vec<RequestDescriptor>>,
    ) -> Self {
        Self {
            transport,
            aggregator,
            credential,
            catalog,
            webhook_base_url: String::new(),
            secret_path: String::new(),
            bot_username: None,
        }
    }

    pub fn with_webhook_info(mut self, webhook_base_url: &str, secret_path: &str) -> Self {
        self.webhook_base_url = webhook_base_url.to_string();
        self.secret_path = secret_path.to_string();
        self
    }

    pub fn with_bot_username(mut self, bot_username: &str) -> Self {
        self.bot_username = Some(bot_username.to_string()).filter(|name| !name.is_empty());
        self
    }

    pub async fn handle(&self, incoming: &IncomingCommand) -> Result<()> {
        let Some(command) = Command::parse(&incoming.text, self.bot_username.as_deref()) else {
            tracing::debug!(
                chat_id = incoming.chat_id,
                "Ignoring non-command message or command for another bot"
            );
            return Ok(());
        };

        tracing::info!(
            chat_id = incoming.chat_id,
            requester_id = incoming.requester_id,
            "📨 Command {:?}",
            CommandName(&command)
        );

        match command {
            Command::Start => self.reply(incoming, presentation::GREETING_TEXT).await,
            Command::Ping => self.reply(incoming, presentation::PONG_TEXT).await,
            Command::Report => self.handle_report(incoming).await,
            Command::SetCredential(args) => self.handle_set_credential(incoming, &args).await,
            Command::Status => {
                let text = presentation::render_status(&self.status_view());
                self.reply(incoming, &text).await
            }
            Command::Unknown(_) => self.reply(incoming, presentation::UNKNOWN_COMMAND_TEXT).await,
        }
    }

    pub fn status_view(&self) -> StatusView {
        StatusView {
            webhook_base_url: self.webhook_base_url.clone(),
            masked_secret_path: mask_secret(&self.secret_path),
            masked_credential: self.credential.get().masked(),
            admin_id: self.credential.admin_id(),
        }
    }

    async fn handle_report(&self, incoming: &IncomingCommand) -> Result<()> {
        let placeholder = self
            .transport
            .send_message(incoming.chat_id, presentation::WAITING_TEXT)
            .await;

        let report = self.aggregator.run(&self.catalog).await;
        let html = presentation::render_report(&report);

        // 編輯失敗 (例如訊息已被刪除) 就改成送新訊息
        match placeholder {
            Ok(message_id) => {
                if let Err(e) = self
                    .transport
                    .edit_message(incoming.chat_id, message_id, &html)
                    .await
                {
                    tracing::warn!("⚠️ Could not edit placeholder, sending new message: {}", e);
                    self.reply(incoming, &html).await?;
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not send placeholder: {}", e);
                self.reply(incoming, &html).await?;
            }
        }
        Ok(())
    }

    async fn handle_set_credential(&self, incoming: &IncomingCommand, args: &str) -> Result<()> {
        if args.trim().is_empty() {
            let text = if self.credential.is_authorized(incoming.requester_id) {
                presentation::CREDENTIAL_USAGE_TEXT
            } else {
                presentation::CREDENTIAL_DENIED_TEXT
            };
            return self.reply(incoming, text).await;
        }

        let text = match self.credential.set(args, incoming.requester_id) {
            Ok(()) => presentation::CREDENTIAL_UPDATED_TEXT,
            Err(BotError::AuthorizationError { .. }) => presentation::CREDENTIAL_DENIED_TEXT,
            Err(BotError::ValidationError { .. }) => presentation::CREDENTIAL_INVALID_TEXT,
            Err(e) => return Err(e),
        };
        self.reply(incoming, text).await
    }

    async fn reply(&self, incoming: &IncomingCommand, text: &str) -> Result<()> {
        self.transport.send_message(incoming.chat_id, text).await?;
        Ok(())
    }
}

/// 記錄指令時不輸出 /settoken 的參數
struct CommandName<'a>(&'a Command);

impl std::fmt::Debug for CommandName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Command::SetCredential(_) => f.write_str("SetCredential(..)"),
            other => write!(f, "{:?}", other),
        }
    }
}
