//! Perplexity 검색 증강 completion 클라이언트.
//!
//! 응답 본문(`choices[0].message.content`)과 인용 URL 목록을 돌려줍니다. 인용은
//! 최상위 `citations` 또는 `choices[0].message.citations`에 문자열이나
//! `{url|link}` 객체 형태로 내려옵니다.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar-pro";

/// 검색 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// 검색 기간 필터 ("day", "week", "month")
    pub recency: String,
}

/// 검색 응답.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub content: String,
    /// 응답 순서 그대로의 인용 목록 (1부터 번호가 매겨짐)
    pub citations: Vec<String>,
}

/// 검색 증강 completion 서비스.
#[async_trait]
pub trait SearchCompletion: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

/// 인용 목록 추출. URL 필터링은 파서가 담당하므로 여기서는 문자열만 모읍니다.
pub fn extract_citations(body: &Value) -> Vec<String> {
    let top_level = body.get("citations").and_then(Value::as_array);
    let nested = body
        .pointer("/choices/0/message/citations")
        .and_then(Value::as_array);

    let list = match top_level {
        Some(list) if !list.is_empty() => list,
        _ => match nested {
            Some(list) => list,
            None => return Vec::new(),
        },
    };

    list.iter()
        .map(|item| match item {
            Value::String(url) => url.clone(),
            Value::Object(obj) => obj
                .get("url")
                .or_else(|| obj.get("link"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
        .collect()
}

/// Perplexity API 클라이언트.
#[derive(Clone)]
pub struct PerplexityClient {
    http: Arc<HttpClient>,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    timeout: TimeoutPair,
    proxy: Option<String>,
    insecure: bool,
}

impl PerplexityClient {
    pub fn new(http: Arc<HttpClient>, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_PERPLEXITY_BASE_URL.to_string(),
            model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            timeout: TimeoutPair::from_secs(30, 90),
            proxy: None,
            insecure: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutPair) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchCompletion for PerplexityClient {
    fn name(&self) -> &str {
        "Perplexity"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DataError::MissingCredential("PERPLEXITY_API_KEY".to_string()))?;

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "return_citations": true,
            "search_recency_filter": request.recency,
        });

        let spec = RequestSpec::post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(payload)
            .timeout(self.timeout)
            .proxy(self.proxy.clone())
            .insecure(self.insecure);

        let body: Value = self.http.get_json(&spec).await?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::Parse("missing choices[0].message.content".to_string()))?
            .to_string();
        let citations = extract_citations(&body);

        debug!(
            chars = content.chars().count(),
            citations = citations.len(),
            "검색 응답 수신"
        );
        Ok(SearchResponse { content, citations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use std::time::Duration;

    fn request() -> SearchRequest {
        SearchRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            max_tokens: 100,
            temperature: 0.1,
            recency: "week".to_string(),
        }
    }

    fn http() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        }))
    }

    #[test]
    fn test_citations_top_level_strings() {
        let body = json!({"citations": ["https://a.example", "https://b.example"]});
        assert_eq!(
            extract_citations(&body),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_citations_nested_objects() {
        let body = json!({
            "citations": [],
            "choices": [{"message": {"citations": [
                {"url": "https://a.example"},
                {"link": "https://b.example"},
                {"title": "no url"}
            ]}}]
        });
        assert_eq!(
            extract_citations(&body),
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                String::new()
            ]
        );
    }

    #[tokio::test]
    async fn test_search_sends_bearer_and_parses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer pplx-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "sonar-pro",
                "search_recency_filter": "week"
            })))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"content":"1. [POLICY]\nTITLE: Fed holds"}}],
                "citations":["https://www.reuters.com/a"]}"#,
            )
            .create_async()
            .await;

        let client = PerplexityClient::new(http(), Some(SecretString::from("pplx-test")))
            .with_base_url(server.url());
        let response = client.search(&request()).await.unwrap();
        assert!(response.content.contains("Fed holds"));
        assert_eq!(response.citations.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = PerplexityClient::new(http(), None);
        assert!(matches!(
            client.search(&request()).await,
            Err(DataError::MissingCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_content_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = PerplexityClient::new(http(), Some(SecretString::from("k")))
            .with_base_url(server.url());
        assert!(matches!(client.search(&request()).await, Err(DataError::Parse(_))));
    }
}
