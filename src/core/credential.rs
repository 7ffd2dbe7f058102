use crate::domain::model::Credential;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::sanitize_printable;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// 所有對外請求共用的 bearer token
///
/// 讀取不上鎖，只是 load 目前的指標；寫入整個替換指標，
/// 因此讀者只會看到舊值或新值，不會看到寫到一半的字串。
/// 沒有持久化：重啟後回到設定檔的初始值。
#[derive(Debug)]
pub struct CredentialStore {
    current: ArcSwap<Credential>,
    admin_id: Option<i64>,
}

impl CredentialStore {
    /// `admin_id` 為 `None` 時任何人都能更換 token
    pub fn new(initial: &str, admin_id: Option<i64>) -> Self {
        Self {
            current: ArcSwap::from_pointee(Credential::new(&sanitize_printable(initial))),
            admin_id,
        }
    }

    pub fn get(&self) -> Credential {
        Credential::clone(&self.current.load())
    }

    pub fn admin_id(&self) -> Option<i64> {
        self.admin_id
    }

    pub fn is_authorized(&self, requester_id: i64) -> bool {
        self.admin_id.map_or(true, |admin| admin == requester_id)
    }

    pub fn set(&self, new_value: &str, requester_id: i64) -> Result<()> {
        if !self.is_authorized(requester_id) {
            tracing::warn!(requester_id, "⛔ Credential change rejected: not the admin");
            return Err(BotError::AuthorizationError { requester_id });
        }

        let cleaned = sanitize_printable(new_value);
        if cleaned.is_empty() {
            return Err(BotError::ValidationError {
                message: "credential is empty after removing non-printable characters"
                    .to_string(),
            });
        }

        let credential = Credential::new(&cleaned);
        let masked = credential.masked();
        self.current.store(Arc::new(credential));

        tracing::info!(
            requester_id,
            credential = %masked,
            rotated_at = %chrono::Utc::now().to_rfc3339(),
            "🔑 Bearer credential rotated"
        );
        Ok(())
    }
}
