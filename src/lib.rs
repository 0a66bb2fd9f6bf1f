pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::adapters::http::{build_router, run_server};
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::GatewaySettings;
pub use crate::core::completion::OpenAiCompletionClient;
pub use crate::core::gateway::{GatewayRequest, GatewayResponse, PlanGateway};
pub use crate::core::prompt::{render_prompt, OutputFormat};
pub use crate::utils::error::{CompletionError, GatewayError, Result};
