use crate::config::GatewaySettings;
use crate::core::prompt::render_prompt;
use crate::domain::model::{HealthResponse, MethodNotAllowed, PlanRequest, PlanResponse, RequestMethod};
use crate::domain::ports::{CompletionRequest, CompletionService};
use crate::utils::error::{GatewayError, Result};
use chrono::Local;
use serde::Serialize;

pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// 與框架無關的入站請求
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: RequestMethod,
    pub body: Option<Vec<u8>>,
}

impl GatewayRequest {
    pub fn new(method: &str, body: Option<Vec<u8>>) -> Self {
        Self {
            method: RequestMethod::parse(method),
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl GatewayResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            headers: CORS_HEADERS.to_vec(),
            body: String::new(),
        }
    }

    fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => {
                let mut response = Self::empty(status);
                response.headers.push(("Content-Type", "application/json"));
                response.body = body;
                response
            }
            Err(e) => {
                tracing::error!("❌ Failed to serialize response body: {}", e);
                let mut response = Self::empty(500);
                response.headers.push(("Content-Type", "application/json"));
                response.body = r#"{"success":false,"error":"Internal serialization error"}"#.to_string();
                response
            }
        }
    }

    /// 傳輸層在進入 gateway 前就失敗時，仍回傳同樣的 JSON 格式與 CORS 標頭
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &PlanResponse::failed(message.into()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

pub struct PlanGateway<S: CompletionService> {
    settings: GatewaySettings,
    completion: S,
}

impl<S: CompletionService> PlanGateway<S> {
    pub fn new(settings: GatewaySettings, completion: S) -> Self {
        Self {
            settings,
            completion,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        tracing::info!(
            "📥 {:?} request received (body: {} bytes)",
            request.method,
            request.body.as_ref().map_or(0, |b| b.len())
        );

        let response = match request.method {
            RequestMethod::Options => GatewayResponse::empty(200),
            RequestMethod::Get => GatewayResponse::json(200, &HealthResponse::now()),
            RequestMethod::Post => match self.generate(request.body.as_deref()).await {
                Ok(care_plan) => GatewayResponse::json(200, &PlanResponse::generated(care_plan)),
                Err(e) => {
                    tracing::error!(
                        "❌ Care plan generation failed: {} (Category: {:?})",
                        e,
                        e.category()
                    );
                    let message = e.user_message(self.settings.expose_error_detail);
                    GatewayResponse::json(e.status_code(), &PlanResponse::failed(message))
                }
            },
            RequestMethod::Other(ref method) => {
                tracing::warn!("🚫 Method not allowed: {}", method);
                GatewayResponse::json(405, &MethodNotAllowed::default())
            }
        };

        tracing::info!("📤 Responding with status {}", response.status);
        response
    }

    /// POST 流程：驗證輸入、檢查金鑰、組 prompt、呼叫一次上游
    pub async fn generate(&self, body: Option<&[u8]>) -> Result<String> {
        let conditions = parse_conditions(body)?;

        let api_key = match self.settings.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                tracing::error!("🔑 API key configured: false");
                return Err(GatewayError::MissingCredential);
            }
        };
        tracing::debug!("🔑 API key configured: true");

        let today = Local::now().date_naive();
        let prompt = render_prompt(&conditions, today, self.settings.output_format);
        tracing::debug!(
            "📝 Rendered {} prompt ({} chars)",
            self.settings.output_format,
            prompt.len()
        );

        let request = CompletionRequest {
            api_key: api_key.to_string(),
            model: self.settings.model.clone(),
            prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let care_plan = self.completion.complete(&request).await?;
        tracing::info!("✅ Care plan generated ({} chars)", care_plan.len());
        Ok(care_plan)
    }
}

/// 解析請求內容；缺少、空字串或格式錯誤都視為未提供病患狀況
///
/// 只有空白字元的內容照原樣送往上游。
pub fn parse_conditions(body: Option<&[u8]>) -> Result<String> {
    let body = match body {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(GatewayError::conditions_required()),
    };

    let request: PlanRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Request body could not be parsed: {}", e);
        GatewayError::conditions_required()
    })?;

    match request.conditions {
        Some(conditions) if !conditions.is_empty() => Ok(conditions),
        _ => Err(GatewayError::conditions_required()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::OutputFormat;
    use crate::utils::error::{CompletionError, CONDITIONS_REQUIRED_MESSAGE, GENERATION_FAILED_MESSAGE, MISSING_API_KEY_MESSAGE};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    enum Reply {
        Text(String),
        Status(u16, String),
        Empty,
    }

    struct MockCompletion {
        reply: Reply,
        calls: Arc<AtomicUsize>,
        last_request: Arc<Mutex<Option<CompletionRequest>>>,
    }

    impl MockCompletion {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Arc::new(AtomicUsize::new(0)),
                last_request: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl CompletionService for MockCompletion {
        async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Status(status, message) => Err(CompletionError::Status {
                    status: *status,
                    message: message.clone(),
                }),
                Reply::Empty => Err(CompletionError::EmptyCompletion),
            }
        }
    }

    fn settings(api_key: Option<&str>) -> GatewaySettings {
        GatewaySettings {
            api_key: api_key.map(str::to_string),
            ..GatewaySettings::default()
        }
    }

    fn post(body: &str) -> GatewayRequest {
        GatewayRequest::new("POST", Some(body.as_bytes().to_vec()))
    }

    fn body_json(response: &GatewayResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    fn assert_cors(response: &GatewayResponse) {
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            response.header("Access-Control-Allow-Headers"),
            Some("Content-Type")
        );
    }

    #[tokio::test]
    async fn test_options_returns_empty_body_with_cors() {
        let mock = MockCompletion::new(Reply::Text("unused".to_string()));
        let calls = mock.calls.clone();
        let gateway = PlanGateway::new(settings(None), mock);

        let response = gateway.handle(GatewayRequest::new("OPTIONS", None)).await;

        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
        assert_cors(&response);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_returns_health_status() {
        let gateway = PlanGateway::new(settings(None), MockCompletion::new(Reply::Empty));

        let response = gateway.handle(GatewayRequest::new("GET", None)).await;
        let json = body_json(&response);

        assert_eq!(response.status, 200);
        assert_cors(&response);
        assert_eq!(json["status"], "GP Care Plan API is running!");
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_methods_rejected() {
        let gateway = PlanGateway::new(settings(Some("sk-test")), MockCompletion::new(Reply::Empty));

        for method in ["PUT", "DELETE", "PATCH"] {
            let response = gateway.handle(GatewayRequest::new(method, None)).await;
            assert_eq!(response.status, 405);
            assert_cors(&response);
            assert_eq!(body_json(&response), serde_json::json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let mock = MockCompletion::new(Reply::Text("<table>plan</table>".to_string()));
        let calls = mock.calls.clone();
        let last_request = mock.last_request.clone();
        let gateway = PlanGateway::new(settings(Some("sk-test")), mock);

        let response = gateway
            .handle(post(r#"{"conditions": "Type 2 diabetes and osteoarthritis"}"#))
            .await;
        let json = body_json(&response);

        assert_eq!(response.status, 200);
        assert_cors(&response);
        assert_eq!(json["success"], true);
        assert_eq!(json["carePlan"], "<table>plan</table>");
        assert!(json.get("error").is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let sent = last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.api_key, "sk-test");
        assert_eq!(sent.model, "gpt-4o-mini");
        assert_eq!(sent.max_tokens, 4000);
        assert!((sent.temperature - 0.3).abs() < f32::EPSILON);
        assert!(sent
            .prompt
            .ends_with("Patient conditions: Type 2 diabetes and osteoarthritis"));
    }

    #[tokio::test]
    async fn test_output_format_flows_into_prompt() {
        let mock = MockCompletion::new(Reply::Text("| plan |".to_string()));
        let last_request = mock.last_request.clone();
        let gateway = PlanGateway::new(
            GatewaySettings {
                api_key: Some("sk-test".to_string()),
                output_format: OutputFormat::WordMarkdown,
                ..GatewaySettings::default()
            },
            mock,
        );

        let response = gateway.handle(post(r#"{"conditions": "asthma"}"#)).await;
        assert_eq!(response.status, 200);

        let sent = last_request.lock().unwrap().clone().unwrap();
        assert!(sent.prompt.contains("Markdown pipe tables"));
        assert!(!sent.prompt.contains("<table"));
    }

    #[tokio::test]
    async fn test_missing_or_empty_conditions_rejected_without_upstream_call() {
        let mock = MockCompletion::new(Reply::Text("unused".to_string()));
        let calls = mock.calls.clone();
        let gateway = PlanGateway::new(settings(Some("sk-test")), mock);

        let bodies: [Option<&str>; 5] = [
            None,
            Some("{}"),
            Some(r#"{"conditions": ""}"#),
            Some(r#"{"conditions": null}"#),
            Some("not json"),
        ];

        for body in bodies {
            let request = GatewayRequest::new("POST", body.map(|b| b.as_bytes().to_vec()));
            let response = gateway.handle(request).await;
            let json = body_json(&response);

            assert_eq!(response.status, 400, "body: {:?}", body);
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], CONDITIONS_REQUIRED_MESSAGE);
            assert!(json.get("carePlan").is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_whitespace_only_conditions_reach_upstream() {
        let mock = MockCompletion::new(Reply::Text("<table>plan</table>".to_string()));
        let calls = mock.calls.clone();
        let last_request = mock.last_request.clone();
        let gateway = PlanGateway::new(settings(Some("sk-test")), mock);

        let response = gateway.handle(post(r#"{"conditions": "   "}"#)).await;
        let json = body_json(&response);

        assert_eq!(response.status, 200);
        assert_eq!(json["success"], true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let sent = last_request.lock().unwrap().clone().unwrap();
        assert!(sent.prompt.ends_with("Patient conditions:    "));
    }

    #[tokio::test]
    async fn test_missing_api_key_returns_500_without_upstream_call() {
        for api_key in [None, Some(""), Some("  ")] {
            let mock = MockCompletion::new(Reply::Text("unused".to_string()));
            let calls = mock.calls.clone();
            let gateway = PlanGateway::new(settings(api_key), mock);

            let response = gateway.handle(post(r#"{"conditions": "asthma"}"#)).await;
            let json = body_json(&response);

            assert_eq!(response.status, 500);
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], MISSING_API_KEY_MESSAGE);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_validation_checked_before_credential() {
        let gateway = PlanGateway::new(settings(None), MockCompletion::new(Reply::Empty));

        let response = gateway.handle(post("{}")).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_upstream_failure_collapses_to_generic_error() {
        let gateway = PlanGateway::new(
            settings(Some("sk-test")),
            MockCompletion::new(Reply::Status(429, "Rate limit reached".to_string())),
        );

        let response = gateway.handle(post(r#"{"conditions": "asthma"}"#)).await;
        let json = body_json(&response);

        assert_eq!(response.status, 500);
        assert_cors(&response);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], GENERATION_FAILED_MESSAGE);
        assert!(json.get("carePlan").is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_detail_when_exposed() {
        let gateway = PlanGateway::new(
            GatewaySettings {
                api_key: Some("sk-test".to_string()),
                expose_error_detail: true,
                ..GatewaySettings::default()
            },
            MockCompletion::new(Reply::Empty),
        );

        let response = gateway.handle(post(r#"{"conditions": "asthma"}"#)).await;
        let json = body_json(&response);

        assert_eq!(response.status, 500);
        let error = json["error"].as_str().unwrap();
        assert!(error.starts_with(GENERATION_FAILED_MESSAGE));
        assert!(error.contains("no generated text"));
    }

    #[test]
    fn test_failure_response_has_envelope_and_cors() {
        let response = GatewayResponse::failure(413, "Request body too large");
        let json = body_json(&response);

        assert_eq!(response.status, 413);
        assert_cors(&response);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Request body too large");
        assert!(json.get("carePlan").is_none());
    }

    #[test]
    fn test_parse_conditions_keeps_text_verbatim() {
        let body: &[u8] = br#"{"conditions": "  COPD <script>alert(1)</script>  ", "extra": 1}"#;
        assert_eq!(
            parse_conditions(Some(body)).unwrap(),
            "  COPD <script>alert(1)</script>  "
        );
    }

    #[test]
    fn test_parse_conditions_rejects_non_string() {
        for body in [
            r#"{"conditions": 42}"#,
            r#"{"conditions": true}"#,
            r#"{"conditions": ["asthma", "COPD"]}"#,
            r#"{"conditions": {"name": "asthma"}}"#,
        ] {
            let err = parse_conditions(Some(body.as_bytes())).unwrap_err();
            assert_eq!(err.status_code(), 400, "body: {}", body);
            assert_eq!(err.user_message(false), CONDITIONS_REQUIRED_MESSAGE);
        }
    }
}
