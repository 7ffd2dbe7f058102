use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("User {requester_id} is not allowed to change the credential")]
    AuthorizationError { requester_id: i64 },

    #[error("Upstream rejected the credential for '{category}' (401)")]
    UpstreamAuthError { category: String },

    #[error("Upstream call for '{category}' failed: {message}")]
    UpstreamTransientError { category: String, message: String },

    #[error("Chat transport error: {message}")]
    TransportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authorization,
    Validation,
    Upstream,
    Transport,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::ConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BotError::AuthorizationError { .. } => ErrorCategory::Authorization,
            BotError::ValidationError { .. } => ErrorCategory::Validation,
            BotError::UpstreamAuthError { .. }
            | BotError::UpstreamTransientError { .. }
            | BotError::ApiError(_) => ErrorCategory::Upstream,
            BotError::TransportError { .. } => ErrorCategory::Transport,
            BotError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Authorization => ErrorSeverity::Low,
            ErrorCategory::Upstream | ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 401 與其他上游錯誤必須分開，報表靠這個決定是否顯示換 token 的警告
    pub fn is_upstream_unauthorized(&self) -> bool {
        matches!(self, BotError::UpstreamAuthError { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            BotError::AuthorizationError { .. } => {
                "You are not allowed to change the credential".to_string()
            }
            BotError::UpstreamAuthError { category } => {
                format!("The registry rejected the credential while querying '{}'", category)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the environment variables / CLI flags and the catalog file"
            }
            ErrorCategory::Authorization => "Ask the configured admin to rotate the credential",
            ErrorCategory::Validation => "Provide a non-empty value made of printable characters",
            ErrorCategory::Upstream => {
                "Check connectivity to the registry; on 401 rotate the credential with /settoken"
            }
            ErrorCategory::Transport => "Check the bot token and the chat platform status",
            ErrorCategory::System => "Check file permissions and available resources",
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
