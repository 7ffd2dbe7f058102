use crate::domain::model::{FetchOutcome, RequestDescriptor};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 對單一 descriptor 查詢筆數。實作不得回傳錯誤：任何失敗都要折成 count = 0 的 outcome
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn fetch_count(&self, descriptor: &RequestDescriptor) -> FetchOutcome;
}

/// 聊天平台送出訊息的最小介面
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// 傳送 HTML 訊息，回傳 message id
    async fn send_message(&self, chat_id: i64, html: &str) -> Result<i64>;

    async fn edit_message(&self, chat_id: i64, message_id: i64, html: &str) -> Result<()>;
}
