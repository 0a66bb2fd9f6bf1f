use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const HEALTH_STATUS: &str = "GP Care Plan API is running!";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// ISO-8601 UTC 時間戳，精確到毫秒 (例: 2025-07-01T03:04:05.678Z)
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    Options,
    Get,
    Post,
    Other(String),
}

impl RequestMethod {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "OPTIONS" => RequestMethod::Options,
            "GET" => RequestMethod::Get,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanResponse {
    success: bool,
    #[serde(rename = "carePlan", skip_serializing_if = "Option::is_none")]
    care_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

impl PlanResponse {
    pub fn generated(care_plan: String) -> Self {
        Self {
            success: true,
            care_plan: Some(care_plan),
            error: None,
            timestamp: timestamp_now(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            care_plan: None,
            error: Some(error),
            timestamp: timestamp_now(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn care_plan(&self) -> Option<&str> {
        self.care_plan.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn now() -> Self {
        Self {
            status: HEALTH_STATUS.to_string(),
            timestamp: timestamp_now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodNotAllowed {
    pub error: String,
}

impl Default for MethodNotAllowed {
    fn default() -> Self {
        Self {
            error: METHOD_NOT_ALLOWED_MESSAGE.to_string(),
        }
    }
}
