#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::core::completion::DEFAULT_API_BASE_URL;
use crate::core::prompt::OutputFormat;
use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_TEMPERATURE: &str = "OPENAI_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
pub const ENV_TIMEOUT_SECONDS: &str = "OPENAI_TIMEOUT_SECONDS";
pub const ENV_OUTPUT_FORMAT: &str = "CARE_PLAN_FORMAT";
pub const ENV_EXPOSE_ERRORS: &str = "CARE_PLAN_EXPOSE_ERRORS";

/// 注入 gateway 的設定值；請求期間不再讀取環境變數
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// 缺少金鑰不會在啟動時失敗，只會讓 POST 回 500
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub output_format: OutputFormat,
    pub expose_error_detail: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECONDS,
            output_format: OutputFormat::default(),
            expose_error_detail: false,
        }
    }
}

impl GatewaySettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 由任意來源查詢變數，方便測試時不動到行程環境
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_key: get(ENV_API_KEY),
            api_base_url: get(ENV_BASE_URL).unwrap_or(defaults.api_base_url),
            model: get(ENV_MODEL).unwrap_or(defaults.model),
            temperature: parse_var(ENV_TEMPERATURE, get(ENV_TEMPERATURE), defaults.temperature)?,
            max_tokens: parse_var(ENV_MAX_TOKENS, get(ENV_MAX_TOKENS), defaults.max_tokens)?,
            request_timeout_secs: parse_var(
                ENV_TIMEOUT_SECONDS,
                get(ENV_TIMEOUT_SECONDS),
                defaults.request_timeout_secs,
            )?,
            output_format: parse_var(
                ENV_OUTPUT_FORMAT,
                get(ENV_OUTPUT_FORMAT),
                defaults.output_format,
            )?,
            expose_error_detail: match get(ENV_EXPOSE_ERRORS) {
                Some(value) => parse_flag(ENV_EXPOSE_ERRORS, &value)?,
                None => defaults.expose_error_detail,
            },
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Validate for GatewaySettings {
    fn validate(&self) -> Result<()> {
        validate_url("api_base_url", &self.api_base_url)?;
        validate_non_empty_string("model", &self.model)?;
        validate_range("temperature", self.temperature, 0.0, 2.0)?;
        validate_range("max_tokens", self.max_tokens, 1, 128_000)?;
        validate_positive_number("request_timeout_secs", self.request_timeout_secs, 1)?;

        if !self.has_api_key() {
            tracing::warn!(
                "⚠️ {} is not set; plan generation requests will fail until it is configured",
                ENV_API_KEY
            );
        }

        tracing::debug!("✅ Gateway configuration validation passed");
        Ok(())
    }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| GatewayError::InvalidConfigValue {
                field: name.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

pub(crate) fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::InvalidConfigValue {
            field: name.to_string(),
            value: value.to_string(),
            reason: "Expected true/false".to_string(),
        }),
    }
}
