use crate::utils::validation::mask_secret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 一個統計類別要打的請求 (endpoint + JSON body)，啟動後不再變動
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub category: String,
    pub endpoint: String,
    pub payload: serde_json::Value,
}

impl RequestDescriptor {
    pub fn new(
        category: impl Into<String>,
        endpoint: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            category: category.into(),
            endpoint: endpoint.into(),
            payload,
        }
    }
}

/// 單次呼叫的結果。失敗時 count 一律為 0，只有 401 會設 auth_failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub category: String,
    pub count: u64,
    pub auth_failed: bool,
}

impl FetchOutcome {
    pub fn success(category: impl Into<String>, count: u64) -> Self {
        Self {
            category: category.into(),
            count,
            auth_failed: false,
        }
    }

    pub fn unauthorized(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            count: 0,
            auth_failed: true,
        }
    }

    pub fn failed(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            count: 0,
            auth_failed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub category: String,
    pub count: u64,
}

impl ReportEntry {
    pub fn has_records(&self) -> bool {
        self.count > 0
    }
}

/// 一次彙總的完整結果，entries 依 catalog 順序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
    any_auth_failed: bool,
}

impl Report {
    /// outcomes 必須已依 catalog 順序排好
    pub fn from_outcomes(outcomes: Vec<FetchOutcome>) -> Self {
        let any_auth_failed = outcomes.iter().any(|o| o.auth_failed);
        let entries = outcomes
            .into_iter()
            .map(|o| ReportEntry {
                category: o.category,
                count: o.count,
            })
            .collect();

        Self {
            entries,
            any_auth_failed,
        }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn any_auth_failed(&self) -> bool {
        self.any_auth_failed
    }

    /// 總和到 `u64::MAX` 為止，不會溢位
    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bearer token。Debug/Display 只輸出遮罩後的值
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(value: &str) -> Self {
        Self(Arc::from(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
