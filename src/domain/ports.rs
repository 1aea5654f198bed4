use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Everything a generative model needs for one schema-constrained call.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub image_base64: String,
    pub mime_type: String,
    pub response_schema: serde_json::Value,
}

/// A generative-AI backend. Returns the raw text of the first candidate, or
/// `None` when the provider answered without any content.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn generate(&self, request: &ProviderRequest) -> Result<Option<String>>;

    fn name(&self) -> &str;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn provider_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn doctors_csv(&self) -> &str;
    fn allowed_origins(&self) -> &[String];
    fn body_limit_bytes(&self) -> usize;
}
