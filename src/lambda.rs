#[cfg(feature = "lambda")]
use base64::Engine;
#[cfg(feature = "lambda")]
use careplan_gateway::domain::ports::CompletionService;
#[cfg(feature = "lambda")]
use careplan_gateway::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use careplan_gateway::{GatewayRequest, GatewaySettings, OpenAiCompletionClient, PlanGateway};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "lambda")]
use std::collections::HashMap;

/// API Gateway proxy 事件 (REST v1 與 HTTP API v2 皆可)
#[cfg(feature = "lambda")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub http_method: Option<String>,
    pub request_context: Option<RequestContext>,
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[cfg(feature = "lambda")]
#[derive(Debug, Deserialize)]
pub struct RequestContext {
    pub http: Option<HttpContext>,
}

#[cfg(feature = "lambda")]
#[derive(Debug, Deserialize)]
pub struct HttpContext {
    pub method: String,
}

#[cfg(feature = "lambda")]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

#[cfg(feature = "lambda")]
impl ProxyRequest {
    /// 事件沒有帶方法時回傳空字串，由 gateway 回 405
    fn method(&self) -> &str {
        self.http_method
            .as_deref()
            .or_else(|| {
                self.request_context
                    .as_ref()
                    .and_then(|ctx| ctx.http.as_ref())
                    .map(|http| http.method.as_str())
            })
            .unwrap_or_default()
    }

    fn body_bytes(&self) -> Option<Vec<u8>> {
        let body = self.body.as_ref()?;
        if self.is_base64_encoded {
            match base64::engine::general_purpose::STANDARD.decode(body) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    // 解碼失敗時交由 gateway 回 400
                    tracing::warn!("Failed to decode base64 body: {}", e);
                    None
                }
            }
        } else {
            Some(body.clone().into_bytes())
        }
    }
}

#[cfg(feature = "lambda")]
async fn handle_proxy<S: CompletionService>(
    gateway: &PlanGateway<S>,
    payload: &ProxyRequest,
) -> ProxyResponse {
    let request = GatewayRequest::new(payload.method(), payload.body_bytes());
    let response = gateway.handle(request).await;

    ProxyResponse {
        status_code: response.status,
        headers: response
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        body: response.body,
    }
}

#[cfg(feature = "lambda")]
async fn function_handler(
    gateway: &PlanGateway<OpenAiCompletionClient>,
    event: LambdaEvent<ProxyRequest>,
) -> Result<ProxyResponse, Error> {
    Ok(handle_proxy(gateway, &event.payload).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let settings = GatewaySettings::from_env()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    settings
        .validate()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

    let client = OpenAiCompletionClient::new(settings.api_base_url.clone(), settings.request_timeout());
    let gateway = PlanGateway::new(settings, client);
    let gateway = &gateway;

    tracing::info!("Starting careplan-gateway Lambda function");
    run(service_fn(move |event: LambdaEvent<ProxyRequest>| async move {
        function_handler(gateway, event).await
    }))
    .await
}
