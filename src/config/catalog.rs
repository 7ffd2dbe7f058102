use crate::domain::model::RequestDescriptor;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 內建的八個戶籍類別
const BUNDLED_CATALOG: &str = include_str!("../../config/catalog.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub endpoint: String,
    /// POST 的 JSON body (字串形式)
    pub body: String,
}

impl CatalogConfig {
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CATALOG)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 指定路徑就讀檔，否則用內建清單
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("📁 Loading catalog from: {}", path.display());
                Self::from_file(path)
            }
            None => Self::bundled(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REGISTRY_BASE_URL})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 轉成 descriptor，順序與檔案相同
    pub fn into_descriptors(self) -> Result<Vec<RequestDescriptor>> {
        self.validate()?;

        self.categories
            .into_iter()
            .map(|category| -> Result<RequestDescriptor> {
                let payload: serde_json::Value =
                    serde_json::from_str(&category.body).map_err(|e| {
                        BotError::InvalidConfigValueError {
                            field: format!("categories[{}].body", category.name),
                            value: category.body.clone(),
                            reason: format!("Body is not valid JSON: {}", e),
                        }
                    })?;
                Ok(RequestDescriptor::new(category.name, category.endpoint, payload))
            })
            .collect()
    }
}

impl Validate for CatalogConfig {
    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(BotError::ConfigValidationError {
                field: "categories".to_string(),
                message: "catalog must contain at least one category".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(BotError::ConfigValidationError {
                    field: "categories.name".to_string(),
                    message: "category name cannot be empty".to_string(),
                });
            }
            if !seen.insert(category.name.as_str()) {
                return Err(BotError::InvalidConfigValueError {
                    field: "categories.name".to_string(),
                    value: category.name.clone(),
                    reason: "Duplicate category name".to_string(),
                });
            }
            validate_url(&format!("categories[{}].endpoint", category.name), &category.endpoint)?;
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&category.body) {
                return Err(BotError::InvalidConfigValueError {
                    field: format!("categories[{}].body", category.name),
                    value: category.body.clone(),
                    reason: format!("Body is not valid JSON: {}", e),
                });
            }
        }

        Ok(())
    }
}
