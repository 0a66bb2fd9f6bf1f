use thiserror::Error;

/// 對外顯示的固定訊息
pub const CONDITIONS_REQUIRED_MESSAGE: &str = "Patient conditions are required";
pub const MISSING_API_KEY_MESSAGE: &str = "OpenAI API key not configured";
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate care plan. Please try again.";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large";
pub const BODY_UNREADABLE_MESSAGE: &str = "Request body could not be read";

/// 上游 completion 服務的失敗原因
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Completion response could not be parsed: {message}")]
    MalformedResponse { message: String },

    #[error("Completion response contained no generated text")]
    EmptyCompletion,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("OpenAI API key not configured")]
    MissingCredential,

    #[error("Upstream error: {0}")]
    Upstream(#[from] CompletionError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Upstream,
    Internal,
}

impl GatewayError {
    pub fn conditions_required() -> Self {
        GatewayError::Validation {
            message: CONDITIONS_REQUIRED_MESSAGE.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Validation { .. } => ErrorCategory::Validation,
            GatewayError::MissingCredential
            | GatewayError::Config { .. }
            | GatewayError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            GatewayError::Upstream(_) => ErrorCategory::Upstream,
            GatewayError::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            _ => 500,
        }
    }

    /// 回傳給呼叫端的訊息；上游細節只在 `expose_detail` 時附加
    pub fn user_message(&self, expose_detail: bool) -> String {
        match self {
            GatewayError::Validation { message } => message.clone(),
            GatewayError::MissingCredential => MISSING_API_KEY_MESSAGE.to_string(),
            GatewayError::Upstream(e) if expose_detail => {
                format!("{} ({})", GENERATION_FAILED_MESSAGE, e)
            }
            _ => GENERATION_FAILED_MESSAGE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
