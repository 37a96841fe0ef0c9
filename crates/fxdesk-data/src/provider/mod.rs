//! 데이터 Provider 모듈.
//!
//! 외부 소스에서 지표 값을 가져오는 클라이언트와 fallback 체인을 정의합니다.
//!
//! ## 시세 소스 (`QuoteSource`)
//! - `EastMoneyClient`: 동방재부 외환 보드 (USDCNH, USDHKD, 주요 통화쌍, 달러지수)
//! - `YahooClient`: Yahoo Finance chart API (HKDUSD=X, DX-Y.NYB, 주요 통화쌍)
//! - `FredClient`: FRED 시계열 최신 관측값
//!
//! ## 전용 클라이언트
//! - `CfetsClient`: 인민폐 중간가 이력
//! - `HkmaClient`: HIBOR 일별 고시
//! - `PerplexityClient`: 검색 증강 completion (`SearchCompletion`)
//!
//! ## Fallback 체인
//! - `FallbackChain`: 고정 순서 소스 목록, 소스별 재시도, 첫 성공에서 중단

pub mod cfets;
pub mod eastmoney;
pub mod fred;
pub mod hkma;
pub mod perplexity;
pub mod yahoo;

pub use cfets::{CfetsClient, MidRateFixing, MidRateWindow};
pub use eastmoney::{BoardQuote, EastMoneyClient};
pub use fred::FredClient;
pub use hkma::{HiborFixing, HkmaClient};
pub use perplexity::{PerplexityClient, SearchCompletion, SearchRequest, SearchResponse};
pub use yahoo::YahooClient;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DataError, Result};
use crate::retry::{with_retry, RetryConfig};
use fxdesk_core::round_dp;

/// 심볼 하나의 최신 수치를 돌려주는 소스.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 사람이 읽는 제공자 이름 (`data_sources`에 기록됨).
    fn name(&self) -> &str;

    /// 심볼의 최신 값 조회.
    async fn quote(&self, symbol: &str) -> Result<f64>;
}

/// 제공자 규약별 허용 범위. 범위 밖 값은 실패로 취급하며 보정하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn check(&self, value: f64) -> Result<f64> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(value)
        } else {
            Err(DataError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// 체인의 한 단계: 소스 + 심볼 + 후처리 규칙.
#[derive(Clone)]
pub struct ChainLink {
    source: Arc<dyn QuoteSource>,
    symbol: String,
    invert: bool,
    decimals: Option<u32>,
    range: Option<PlausibleRange>,
}

impl ChainLink {
    pub fn new(source: Arc<dyn QuoteSource>, symbol: impl Into<String>) -> Self {
        Self {
            source,
            symbol: symbol.into(),
            invert: false,
            decimals: None,
            range: None,
        }
    }

    /// 역수 호가 (예: HKDUSD → USDHKD).
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// 소수점 자리 반올림 (범위 검사 전에 적용).
    pub fn rounded(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// 허용 범위 지정.
    pub fn within(mut self, min: f64, max: f64) -> Self {
        self.range = Some(PlausibleRange::new(min, max));
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    async fn fetch(&self) -> Result<f64> {
        let raw = self.source.quote(&self.symbol).await?;
        let mut value = if self.invert {
            if raw == 0.0 {
                return Err(DataError::Parse(format!("cannot invert zero quote for {}", self.symbol)));
            }
            1.0 / raw
        } else {
            raw
        };
        if let Some(dp) = self.decimals {
            value = round_dp(value, dp);
        }
        match &self.range {
            Some(range) => range.check(value),
            None => Ok(value),
        }
    }
}

/// 체인 해석 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedValue {
    pub value: f64,
    /// 값을 제공한 소스 이름
    pub source: String,
}

/// 고정 순서 fallback 체인.
///
/// 각 단계는 `RetryConfig`에 따라 재시도되며, 첫 성공에서 멈춥니다.
/// 모든 단계가 실패하면 단계별 진단을 이어 붙인 `DataError::Exhausted`를 반환합니다.
pub struct FallbackChain {
    indicator: String,
    links: Vec<ChainLink>,
}

impl FallbackChain {
    pub fn new(indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            links: Vec::new(),
        }
    }

    pub fn link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub async fn resolve(&self, retry: &RetryConfig) -> Result<SourcedValue> {
        let mut failures = Vec::with_capacity(self.links.len());

        for link in &self.links {
            let label = format!("{}@{}", self.indicator, link.source_name());
            match with_retry(retry, &label, || link.fetch()).await {
                Ok(value) => {
                    info!(
                        indicator = %self.indicator,
                        provider = link.source_name(),
                        symbol = link.symbol(),
                        value = value,
                        "지표 수집 완료"
                    );
                    return Ok(SourcedValue {
                        value,
                        source: link.source_name().to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        indicator = %self.indicator,
                        provider = link.source_name(),
                        error = %e,
                        "소스 실패, 다음 소스로 전환"
                    );
                    failures.push(format!("{}: {}", link.source_name(), e));
                }
            }
        }

        debug!(indicator = %self.indicator, "모든 소스 실패");
        if failures.is_empty() {
            failures.push("no sources configured".to_string());
        }
        Err(DataError::Exhausted(failures.join("; ")))
    }
}

/// JSON 숫자 또는 숫자 문자열을 f64로 변환 ("-", "", "." 같은 자리표시자는 None).
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
