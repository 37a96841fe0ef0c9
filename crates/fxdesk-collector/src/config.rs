//! 환경변수 기반 설정 모듈.

use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

use fxdesk_audit::{AuditEngine, IndicatorTable};
use fxdesk_data::provider::cfets::DEFAULT_CFETS_BASE_URL;
use fxdesk_data::provider::eastmoney::DEFAULT_EASTMONEY_BASE_URL;
use fxdesk_data::provider::fred::DEFAULT_FRED_BASE_URL;
use fxdesk_data::provider::hkma::DEFAULT_HKMA_BASE_URL;
use fxdesk_data::provider::perplexity::{DEFAULT_PERPLEXITY_BASE_URL, DEFAULT_PERPLEXITY_MODEL};
use fxdesk_data::provider::yahoo::DEFAULT_YAHOO_BASE_URL;
use fxdesk_data::{RetryConfig, RetryPolicy, TimeoutPair};
use fxdesk_report::client::{DEFAULT_DEEPSEEK_BASE_URL, DEFAULT_DEEPSEEK_MODEL};
use fxdesk_report::DeepSeekConfig;

use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// API 자격증명
    pub credentials: Credentials,
    /// 검색/리포트 호출용 프록시 (socks5h://, http://)
    pub proxy: Option<String>,
    /// 제공자별 (연결, 읽기) 타임아웃
    pub timeouts: ProviderTimeouts,
    /// 지표 그룹별 캐시 TTL
    pub cache_ttl: CacheTtls,
    /// HTTP 상태 코드 재시도
    pub http_retry: RetryPolicy,
    /// fetcher 수준 재시도
    pub fetch_retry: RetryConfig,
    /// 제공자 base URL
    pub endpoints: Endpoints,
    /// 감사 지표 테이블 TOML 경로 (없으면 내장 테이블)
    pub audit_indicators_path: Option<PathBuf>,
    /// HKMA 인증서 검증 해제
    pub hkma_insecure: bool,
    /// Perplexity 인증서 검증 해제
    pub perplexity_insecure: bool,
}

/// API 자격증명. Debug 출력 시 값은 가려집니다.
#[derive(Clone)]
pub struct Credentials {
    pub fred_api_key: Option<SecretString>,
    pub perplexity_api_key: Option<SecretString>,
    /// DeepSeek 키 (없으면 OPENAI_API_KEY)
    pub deepseek_api_key: Option<SecretString>,
    pub deepseek_model: String,
    pub perplexity_model: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<SecretString>| key.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("fred_api_key", &mask(&self.fred_api_key))
            .field("perplexity_api_key", &mask(&self.perplexity_api_key))
            .field("deepseek_api_key", &mask(&self.deepseek_api_key))
            .field("deepseek_model", &self.deepseek_model)
            .field("perplexity_model", &self.perplexity_model)
            .finish()
    }
}

/// 제공자별 타임아웃 (`TIMEOUT_<PROVIDER>="connect,read"`로 덮어쓰기).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimeouts {
    pub default: TimeoutPair,
    pub cfets: TimeoutPair,
    pub eastmoney: TimeoutPair,
    pub fred: TimeoutPair,
    pub perplexity: TimeoutPair,
    pub yahoo: TimeoutPair,
    pub hkma: TimeoutPair,
    pub deepseek: TimeoutPair,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self {
            default: TimeoutPair::from_secs(10, 30),
            cfets: TimeoutPair::from_secs(10, 20),
            eastmoney: TimeoutPair::from_secs(10, 20),
            fred: TimeoutPair::from_secs(10, 30),
            perplexity: TimeoutPair::from_secs(30, 90),
            yahoo: TimeoutPair::from_secs(10, 15),
            hkma: TimeoutPair::from_secs(10, 20),
            deepseek: TimeoutPair::from_secs(10, 120),
        }
    }
}

/// 캐시 TTL (`CACHE_TTL_<KEY>` 초 단위로 덮어쓰기).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub cny_mid: Duration,
    pub cny_spot: Duration,
    pub hkd: Duration,
    pub fred: Duration,
    pub global_fx: Duration,
    pub news: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            cny_mid: Duration::from_secs(3600),
            cny_spot: Duration::from_secs(60),
            hkd: Duration::from_secs(60),
            fred: Duration::from_secs(300),
            global_fx: Duration::from_secs(60),
            news: Duration::from_secs(600),
        }
    }
}

/// 제공자 base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub fred: String,
    pub cfets: String,
    pub eastmoney: String,
    pub yahoo: String,
    pub hkma: String,
    pub perplexity: String,
    pub deepseek: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fred: DEFAULT_FRED_BASE_URL.to_string(),
            cfets: DEFAULT_CFETS_BASE_URL.to_string(),
            eastmoney: DEFAULT_EASTMONEY_BASE_URL.to_string(),
            yahoo: DEFAULT_YAHOO_BASE_URL.to_string(),
            hkma: DEFAULT_HKMA_BASE_URL.to_string(),
            perplexity: DEFAULT_PERPLEXITY_BASE_URL.to_string(),
            deepseek: DEFAULT_DEEPSEEK_BASE_URL.to_string(),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수에서 설정 생성 (테스트용).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.trim().to_string()))
        };

        let credentials = Credentials {
            fred_api_key: secret("FRED_API_KEY"),
            perplexity_api_key: secret("PERPLEXITY_API_KEY"),
            deepseek_api_key: secret("DEEPSEEK_API_KEY").or_else(|| secret("OPENAI_API_KEY")),
            deepseek_model: lookup("DEEPSEEK_MODEL_NAME")
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.to_string()),
            perplexity_model: lookup("PERPLEXITY_MODEL")
                .unwrap_or_else(|| DEFAULT_PERPLEXITY_MODEL.to_string()),
        };

        let defaults = ProviderTimeouts::default();
        let timeout = |provider: &str, default: TimeoutPair| -> Result<TimeoutPair> {
            let key = format!("TIMEOUT_{}", provider);
            match lookup(&key) {
                Some(raw) => parse_timeout_pair(&raw).ok_or_else(|| {
                    crate::error::CollectorError::Config(format!(
                        "{} 형식이 잘못되었습니다 (예: \"10,30\"): {}",
                        key, raw
                    ))
                }),
                None => Ok(default),
            }
        };
        let timeouts = ProviderTimeouts {
            default: timeout("DEFAULT", defaults.default)?,
            cfets: timeout("CFETS", defaults.cfets)?,
            eastmoney: timeout("EASTMONEY", defaults.eastmoney)?,
            fred: timeout("FRED", defaults.fred)?,
            perplexity: timeout("PERPLEXITY", defaults.perplexity)?,
            yahoo: timeout("YAHOO", defaults.yahoo)?,
            hkma: timeout("HKMA", defaults.hkma)?,
            deepseek: timeout("DEEPSEEK", defaults.deepseek)?,
        };

        let ttl_defaults = CacheTtls::default();
        let ttl = |key: &str, default: Duration| {
            Duration::from_secs(env_var_parse(
                &lookup,
                &format!("CACHE_TTL_{}", key),
                default.as_secs(),
            ))
        };
        let cache_ttl = CacheTtls {
            cny_mid: ttl("CNY_MID", ttl_defaults.cny_mid),
            cny_spot: ttl("CNY_SPOT", ttl_defaults.cny_spot),
            hkd: ttl("HKD", ttl_defaults.hkd),
            fred: ttl("FRED", ttl_defaults.fred),
            global_fx: ttl("GLOBAL_FX", ttl_defaults.global_fx),
            news: ttl("NEWS", ttl_defaults.news),
        };

        let endpoint_defaults = Endpoints::default();
        let endpoint = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(default)
        };
        let endpoints = Endpoints {
            fred: endpoint("FRED_BASE_URL", endpoint_defaults.fred),
            cfets: endpoint("CFETS_BASE_URL", endpoint_defaults.cfets),
            eastmoney: endpoint("EASTMONEY_BASE_URL", endpoint_defaults.eastmoney),
            yahoo: endpoint("YAHOO_BASE_URL", endpoint_defaults.yahoo),
            hkma: endpoint("HKMA_BASE_URL", endpoint_defaults.hkma),
            perplexity: endpoint("PERPLEXITY_BASE_URL", endpoint_defaults.perplexity),
            deepseek: endpoint("DEEPSEEK_BASE_URL", endpoint_defaults.deepseek),
        };

        let proxy = lookup("SOCKS5_PROXY")
            .filter(|v| !v.trim().is_empty())
            .map(|v| normalize_socks_proxy(&v))
            .or_else(|| lookup("HTTPS_PROXY").filter(|v| !v.trim().is_empty()))
            .or_else(|| lookup("HTTP_PROXY").filter(|v| !v.trim().is_empty()));

        Ok(Self {
            credentials,
            proxy,
            timeouts,
            cache_ttl,
            http_retry: RetryPolicy {
                max_retries: env_var_parse(&lookup, "HTTP_MAX_RETRIES", 3),
                base_delay: Duration::from_millis(env_var_parse(&lookup, "HTTP_BACKOFF_MS", 500)),
            },
            fetch_retry: RetryConfig::new(
                env_var_parse(&lookup, "FETCH_MAX_ATTEMPTS", 3),
                Duration::from_millis(env_var_parse(&lookup, "FETCH_BACKOFF_MS", 1000)),
            ),
            endpoints,
            audit_indicators_path: lookup("AUDIT_INDICATORS_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            hkma_insecure: env_var_bool(&lookup, "HKMA_INSECURE", true),
            perplexity_insecure: env_var_bool(&lookup, "PERPLEXITY_INSECURE", true),
        })
    }

    /// DeepSeek 클라이언트 설정
    pub fn deepseek(&self) -> DeepSeekConfig {
        DeepSeekConfig {
            api_key: self.credentials.deepseek_api_key.clone(),
            base_url: self.endpoints.deepseek.clone(),
            model: self.credentials.deepseek_model.clone(),
            timeout: self.timeouts.deepseek,
            proxy: self.proxy.clone(),
        }
    }

    /// 감사 엔진 (`AUDIT_INDICATORS_PATH`가 있으면 해당 테이블 사용)
    pub fn audit_engine(&self) -> Result<AuditEngine> {
        let table = match &self.audit_indicators_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "감사 지표 테이블 로드");
                IndicatorTable::load(path)?
            }
            None => IndicatorTable::default(),
        };
        Ok(AuditEngine::new(table))
    }
}

/// `"connect,read"` 초 단위 문자열 파싱
fn parse_timeout_pair(raw: &str) -> Option<TimeoutPair> {
    let (connect, read) = raw.split_once(',')?;
    let connect = connect.trim().parse().ok()?;
    let read = read.trim().parse().ok()?;
    Some(TimeoutPair::from_secs(connect, read))
}

/// SOCKS5 프록시는 원격 DNS 해석(socks5h)으로 통일
fn normalize_socks_proxy(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("socks5://") {
        format!("socks5h://{}", rest)
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        format!("socks5h://{}", raw)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
