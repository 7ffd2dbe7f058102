use crate::core::credential::CredentialStore;
use crate::domain::model::{FetchOutcome, RequestDescriptor};
use crate::domain::ports::CountSource;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// 回應中筆數所在的欄位
const TOTAL_POINTER: &str = "/result/totalElements";

/// 2^64，大於等於它的浮點數無法轉成 u64
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// 透過 HTTP POST 查詢戶籍系統的筆數
///
/// 每次呼叫時才讀取 credential，所以換 token 後下一個請求就會用新值。
pub struct HttpCountSource {
    client: Client,
    credential: Arc<CredentialStore>,
    timeout: Duration,
}

impl HttpCountSource {
    pub fn new(credential: Arc<CredentialStore>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            credential,
            timeout,
        }
    }

    async fn post_for_total(&self, descriptor: &RequestDescriptor) -> Result<u64> {
        let credential = self.credential.get();

        let mut request = self
            .client
            .post(&descriptor.endpoint)
            .json(&descriptor.payload)
            .timeout(self.timeout);

        // 沒有 token 時不送 Authorization header
        if !credential.is_empty() {
            request = request.bearer_auth(credential.as_str());
        }

        tracing::debug!("Making API request to: {}", descriptor.endpoint);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(BotError::UpstreamAuthError {
                category: descriptor.category.clone(),
            });
        }

        if !status.is_success() {
            return Err(BotError::UpstreamTransientError {
                category: descriptor.category.clone(),
                message: format!("HTTP {}", status),
            });
        }

        let body: serde_json::Value = response.json().await?;
        extract_total(&body).map_err(|message| BotError::UpstreamTransientError {
            category: descriptor.category.clone(),
            message,
        })
    }
}

#[async_trait]
impl CountSource for HttpCountSource {
    async fn fetch_count(&self, descriptor: &RequestDescriptor) -> FetchOutcome {
        match self.post_for_total(descriptor).await {
            Ok(total) => {
                tracing::debug!("✅ {}: {} records", descriptor.category, total);
                FetchOutcome::success(descriptor.category.clone(), total)
            }
            Err(e) if e.is_upstream_unauthorized() => {
                tracing::warn!(
                    category = %descriptor.category,
                    endpoint = %descriptor.endpoint,
                    "🔒 401 Unauthorized"
                );
                FetchOutcome::unauthorized(descriptor.category.clone())
            }
            Err(e) => {
                tracing::warn!(
                    category = %descriptor.category,
                    "⚠️ Fetch failed: {}",
                    e
                );
                FetchOutcome::failed(descriptor.category.clone())
            }
        }
    }
}

/// 取出 `result.totalElements`，欄位不存在或為 null 時視為 0
pub fn extract_total(body: &serde_json::Value) -> std::result::Result<u64, String> {
    match body.pointer(TOTAL_POINTER) {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(serde_json::Value::Number(n)) => {
            if let Some(total) = n.as_u64() {
                Ok(total)
            } else {
                match n.as_f64() {
                    // 超出 u64 範圍的浮點數視為格式錯誤，不截斷
                    Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < U64_LIMIT => {
                        Ok(f as u64)
                    }
                    _ => Err(format!("totalElements is not a non-negative integer: {}", n)),
                }
            }
        }
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("totalElements is not numeric: {:?}", s)),
        Some(other) => Err(format!("unexpected totalElements value: {}", other)),
    }
}
