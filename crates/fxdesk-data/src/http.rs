//! 재시도 HTTP 클라이언트.
//!
//! 응답 코드가 {429, 500, 502, 503, 504}이면 `base_delay × 2^attempt` 간격으로
//! 최대 `max_retries`번 재시도합니다. 그 밖의 실패(연결 오류, 4xx, 잘못된 본문)는
//! 곧바로 `HttpError`로 호출자에게 전달됩니다.
//!
//! 프록시와 인증서 검증 해제는 요청 단위로 지정합니다 (`RequestSpec::proxy`,
//! `RequestSpec::insecure`). 전역 설정으로 두지 않습니다.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::HttpError;

/// 재시도 대상 상태 코드.
pub const RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// (연결, 읽기) 타임아웃.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPair {
    pub connect: Duration,
    pub read: Duration,
}

impl TimeoutPair {
    pub fn from_secs(connect: u64, read: u64) -> Self {
        Self {
            connect: Duration::from_secs(connect),
            read: Duration::from_secs(read),
        }
    }

    /// 요청 전체 상한 (연결 + 읽기).
    pub fn total(&self) -> Duration {
        self.connect + self.read
    }
}

impl Default for TimeoutPair {
    fn default() -> Self {
        Self::from_secs(10, 30)
    }
}

/// 상태 코드 재시도 정책.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// `attempt`번째(0부터) 재시도 전 대기 시간.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// 요청 명세.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
    pub timeout: TimeoutPair,
    /// 프록시 URL (http://, https://, socks5h://)
    pub proxy: Option<String>,
    /// 인증서 검증 해제 (가로채기 프록시 뒤의 특정 제공자 전용)
    pub insecure: bool,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            json: None,
            timeout: TimeoutPair::default(),
            proxy: None,
            insecure: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: TimeoutPair) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// 성공 응답.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(HttpError::malformed)
    }
}

/// 연결 타임아웃, 프록시, 인증서 검증은 reqwest에서 클라이언트 단위 설정이므로 조합별로 재사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    connect_ms: u128,
    proxy: Option<String>,
    insecure: bool,
}

/// 재시도 HTTP 클라이언트.
pub struct HttpClient {
    policy: RetryPolicy,
    user_agent: String,
    clients: Mutex<HashMap<ClientKey, Client>>,
}

impl HttpClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn client_for(&self, spec: &RequestSpec) -> Result<Client, HttpError> {
        let key = ClientKey {
            connect_ms: spec.timeout.connect.as_millis(),
            proxy: spec.proxy.clone(),
            insecure: spec.insecure,
        };

        let mut clients = self
            .clients
            .lock()
            .map_err(|_| HttpError::new(None, "client pool poisoned"))?;
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder()
            .connect_timeout(spec.timeout.connect)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(spec.insecure);
        builder = match &spec.proxy {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                    HttpError::new(None, format!("invalid proxy {}: {}", proxy_url, e))
                })?;
                builder.proxy(proxy)
            }
            // 환경변수 프록시(HTTP_PROXY 등)는 지정한 요청에만 적용
            None => builder.no_proxy(),
        };
        let client = builder.build()?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    /// 요청 실행. 재시도 대상 상태 코드만 재시도합니다.
    pub async fn send(&self, spec: &RequestSpec) -> Result<HttpResponse, HttpError> {
        let client = self.client_for(spec)?;
        let mut attempt = 0u32;

        loop {
            let mut request = client
                .request(spec.method.clone(), &spec.url)
                .timeout(spec.timeout.total());
            for (name, value) in &spec.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            if !spec.query.is_empty() {
                request = request.query(&spec.query);
            }
            if let Some(body) = &spec.json {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();

            if RETRY_STATUS_CODES.contains(&status) && attempt < self.policy.max_retries {
                let delay = self.policy.delay_for(attempt);
                warn!(
                    url = %spec.url,
                    status = status,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "재시도 대상 응답, 대기 후 재요청"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await?;
            if !(200..300).contains(&status) {
                return Err(HttpError::new(Some(status), body));
            }

            debug!(url = %spec.url, status = status, bytes = body.len(), "HTTP 응답 수신");
            return Ok(HttpResponse { status, body });
        }
    }

    /// 요청 후 JSON 본문 역직렬화.
    pub async fn get_json<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, HttpError> {
        self.send(spec).await?.json()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
