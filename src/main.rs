use std::sync::Arc;

use careplan_gateway::utils::{logger, validation::Validate};
use careplan_gateway::{run_server, CliConfig, OpenAiCompletionClient, PlanGateway};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting careplan-gateway");

    let options = match cli.resolve() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = options.settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        "Model: {}, format: {}, API key configured: {}",
        options.settings.model,
        options.settings.output_format,
        options.settings.has_api_key()
    );

    let client = OpenAiCompletionClient::new(
        options.settings.api_base_url.clone(),
        options.settings.request_timeout(),
    );
    let gateway = Arc::new(PlanGateway::new(options.settings, client));

    run_server(gateway, &options.bind, options.port).await
}
