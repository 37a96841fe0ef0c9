//! Chat completion 클라이언트.
//!
//! 리포트 생성 모델은 불투명한 요청/응답 함수로만 다룹니다. 기본 구현은
//! OpenAI 호환 `/chat/completions` 엔드포인트를 쓰는 DeepSeek입니다.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ReportError, Result};
use fxdesk_data::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

/// 대화 메시지.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// completion 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Chat completion 서비스.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn name(&self) -> &str;

    /// 첫 번째 선택지의 본문 반환.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// DeepSeek 클라이언트 설정.
#[derive(Clone)]
pub struct DeepSeekConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout: TimeoutPair,
    /// 프록시 URL (socks5h://, http://)
    pub proxy: Option<String>,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_DEEPSEEK_BASE_URL.to_string(),
            model: DEFAULT_DEEPSEEK_MODEL.to_string(),
            timeout: TimeoutPair::from_secs(10, 120),
            proxy: None,
        }
    }
}

impl std::fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// OpenAI 호환 DeepSeek 클라이언트.
pub struct DeepSeekClient {
    http: Arc<HttpClient>,
    config: DeepSeekConfig,
}

impl DeepSeekClient {
    pub fn new(http: Arc<HttpClient>, config: DeepSeekConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl ChatClient for DeepSeekClient {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ReportError::MissingCredential("DEEPSEEK_API_KEY".to_string()))?;

        let payload = json!({
            "model": self.config.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let spec = RequestSpec::post(format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        ))
        .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
        .header("Content-Type", "application/json")
        .json(payload)
        .timeout(self.config.timeout)
        .proxy(self.config.proxy.clone());

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "chat completion 요청"
        );
        let body: Value = self.http.get_json(&spec).await?;

        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReportError::EmptyCompletion(self.config.model.clone()))?;

        info!(model = %self.config.model, chars = content.chars().count(), "chat completion 수신");
        Ok(content.to_string())
    }
}
