use crate::config::toml_config::TomlConfig;
use crate::config::GatewaySettings;
use crate::core::prompt::OutputFormat;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Parser)]
#[command(name = "careplan-gateway")]
#[command(about = "HTTP gateway that turns chronic condition descriptions into GP care plan tables")]
pub struct CliConfig {
    #[arg(long, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Address to bind [default: 0.0.0.0]")]
    pub bind: Option<String>,

    #[arg(long, help = "Port to listen on [default: 3000]")]
    pub port: Option<u16>,

    #[arg(long, help = "Completion service API key (overrides OPENAI_API_KEY)")]
    pub api_key: Option<String>,

    #[arg(long)]
    pub api_base_url: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "html, inline-html or word-markdown")]
    pub format: Option<OutputFormat>,

    #[arg(long, help = "Include upstream error detail in failure responses")]
    pub expose_errors: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// 伺服器實際使用的位址與 gateway 設定
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub bind: String,
    pub port: u16,
    pub settings: GatewaySettings,
}

impl CliConfig {
    /// 優先順序：命令列 > 設定檔 > 環境變數 > 預設值
    pub fn resolve(&self) -> Result<ServerOptions> {
        let mut settings = GatewaySettings::from_env()?;

        let file = match &self.config {
            Some(path) => {
                tracing::debug!("Loading config file: {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        file.apply_to(&mut settings);
        self.apply_to(&mut settings);

        Ok(ServerOptions {
            bind: self
                .bind
                .clone()
                .or_else(|| file.server.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: self.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            settings,
        })
    }

    pub fn apply_to(&self, settings: &mut GatewaySettings) {
        if let Some(api_key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            settings.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &self.api_base_url {
            settings.api_base_url = base_url.clone();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.request_timeout_secs = timeout;
        }
        if let Some(format) = self.format {
            settings.output_format = format;
        }
        if self.expose_errors {
            settings.expose_error_detail = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let cli = CliConfig::parse_from([
            "careplan-gateway",
            "--api-key",
            "sk-cli",
            "--model",
            "gpt-4o",
            "--format",
            "word-markdown",
            "--max-tokens",
            "1200",
            "--expose-errors",
        ]);

        let mut settings = GatewaySettings::default();
        cli.apply_to(&mut settings);

        assert_eq!(settings.api_key.as_deref(), Some("sk-cli"));
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.output_format, OutputFormat::WordMarkdown);
        assert_eq!(settings.max_tokens, 1200);
        assert!(settings.expose_error_detail);
    }

    #[test]
    fn test_unset_flags_keep_existing_values() {
        let cli = CliConfig::parse_from(["careplan-gateway"]);

        let mut settings = GatewaySettings {
            api_key: Some("sk-env".to_string()),
            ..GatewaySettings::default()
        };
        cli.apply_to(&mut settings);

        assert_eq!(settings.api_key.as_deref(), Some("sk-env"));
        assert_eq!(settings.output_format, OutputFormat::Html);
        assert!(!settings.expose_error_detail);
    }

    #[test]
    fn test_invalid_format_rejected_by_parser() {
        assert!(CliConfig::try_parse_from(["careplan-gateway", "--format", "pdf"]).is_err());
    }
}
