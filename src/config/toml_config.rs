use crate::config::GatewaySettings;
use crate::core::prompt::OutputFormat;
use crate::utils::error::{GatewayError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔格式，所有欄位皆可省略
///
/// ```toml
/// [completion]
/// api_key = "${OPENAI_API_KEY}"
/// model = "gpt-4o-mini"
/// temperature = 0.3
///
/// [plan]
/// output_format = "word-markdown"
///
/// [server]
/// port = 8080
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub completion: CompletionSection,
    #[serde(default)]
    pub plan: PlanSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSection {
    pub output_format: Option<OutputFormat>,
    pub expose_error_detail: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GatewayError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GatewayError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})；未設定的變數換成空字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GatewayError::Config {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable {} referenced in config is not set", var_name);
                String::new()
            })
        });

        Ok(result.to_string())
    }

    /// 將檔案中有設定的欄位覆蓋到 settings
    pub fn apply_to(&self, settings: &mut GatewaySettings) {
        let completion = &self.completion;

        if let Some(api_key) = completion.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &completion.base_url {
            settings.api_base_url = base_url.clone();
        }
        if let Some(model) = &completion.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = completion.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = completion.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(timeout) = completion.timeout_seconds {
            settings.request_timeout_secs = timeout;
        }
        if let Some(format) = self.plan.output_format {
            settings.output_format = format;
        }
        if let Some(expose) = self.plan.expose_error_detail {
            settings.expose_error_detail = expose;
        }
    }
}
