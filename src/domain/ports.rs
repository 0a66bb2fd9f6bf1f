use crate::utils::error::CompletionError;
use async_trait::async_trait;

/// 送往 completion 服務的單次請求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// 回傳第一個 choice 的文字內容
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
