use crate::core::gateway::{GatewayRequest, GatewayResponse, PlanGateway};
use crate::domain::ports::CompletionService;
use crate::utils::error::{BODY_TOO_LARGE_MESSAGE, BODY_UNREADABLE_MESSAGE};
use anyhow::Result;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header_name) => {
                    headers.insert(header_name, HeaderValue::from_static(*value));
                }
                Err(e) => tracing::warn!("Skipping invalid header {}: {}", name, e),
            }
        }

        (status, headers, self.body).into_response()
    }
}

/// `/` 與 `/api` 都接受任何方法，交給 gateway 自行分派
pub fn build_router<S>(gateway: Arc<PlanGateway<S>>) -> Router
where
    S: CompletionService + 'static,
{
    Router::new()
        .route("/", any(dispatch::<S>))
        .route("/api", any(dispatch::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn dispatch<S>(
    State(gateway): State<Arc<PlanGateway<S>>>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> GatewayResponse
where
    S: CompletionService + 'static,
{
    // 超過 body 上限等錯誤不經過 gateway，這裡補上相同的回應格式
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!("🚫 Request body rejected: {} ({})", rejection.body_text(), status);
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                BODY_TOO_LARGE_MESSAGE
            } else {
                BODY_UNREADABLE_MESSAGE
            };
            return GatewayResponse::failure(status.as_u16(), message);
        }
    };

    let body = if body.is_empty() {
        None
    } else {
        Some(body.to_vec())
    };

    gateway
        .handle(GatewayRequest::new(method.as_str(), body))
        .await
}

pub async fn run_server<S>(gateway: Arc<PlanGateway<S>>, bind: &str, port: u16) -> Result<()>
where
    S: CompletionService + 'static,
{
    let app = build_router(gateway);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("🚀 careplan-gateway listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("careplan-gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
