//! 인민폐 중간가 (CFETS) 클라이언트.
//!
//! 중국외환거래센터의 USD/CNY 중간가 이력을 조회합니다. 중간가는 매 영업일
//! 09:15에 한 번 고시되므로 호출자는 긴 TTL로 캐시합니다.

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::json_number;
use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};
use fxdesk_core::round_dp;

pub const DEFAULT_CFETS_BASE_URL: &str = "https://www.chinamoney.com.cn";

/// 조회 구간 (영업일 5개를 확보하기 위한 달력일 수).
const LOOKBACK_DAYS: i64 = 14;

/// 고저 범위 계산에 쓰는 최근 고시 개수.
pub const WINDOW_SIZE: usize = 5;

pub const PROVIDER_NAME: &str = "中国外汇交易中心";

/// 하루치 중간가 고시.
#[derive(Debug, Clone, PartialEq)]
pub struct MidRateFixing {
    pub date: String,
    pub rate: f64,
}

/// 최근 중간가 창 (최신 고시 + 최근 5개 고저).
#[derive(Debug, Clone, PartialEq)]
pub struct MidRateWindow {
    pub latest: MidRateFixing,
    pub high: f64,
    pub low: f64,
}

impl MidRateWindow {
    /// 최신순 고시 목록에서 창 계산. 비어 있으면 None.
    pub fn from_fixings(fixings: &[MidRateFixing]) -> Option<Self> {
        let latest = fixings.first()?.clone();
        let recent = &fixings[..fixings.len().min(WINDOW_SIZE)];
        let high = recent.iter().map(|f| f.rate).fold(f64::MIN, f64::max);
        let low = recent.iter().map(|f| f.rate).fold(f64::MAX, f64::min);
        Some(Self {
            latest,
            high: round_dp(high, 4),
            low: round_dp(low, 4),
        })
    }

    /// 표시용 범위 문자열 (`"low - high"`).
    pub fn range_label(&self) -> String {
        format!("{} - {}", self.low, self.high)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    records: Vec<HistoryRecord>,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(default)]
    date: String,
    #[serde(default)]
    values: Vec<serde_json::Value>,
}

/// CFETS 중간가 클라이언트.
#[derive(Clone)]
pub struct CfetsClient {
    http: Arc<HttpClient>,
    base_url: String,
    timeout: TimeoutPair,
}

impl CfetsClient {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            base_url: DEFAULT_CFETS_BASE_URL.to_string(),
            timeout: TimeoutPair::from_secs(10, 20),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutPair) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// `end` 이전 고시를 최신순으로 조회.
    pub async fn recent_fixings(&self, end: NaiveDate) -> Result<Vec<MidRateFixing>> {
        let start = end - ChronoDuration::days(LOOKBACK_DAYS);
        let spec = RequestSpec::get(format!("{}/ags/ms/cm-u-bk-ccpr/CcprHisNew", self.base_url))
            .query("startDate", start.format("%Y-%m-%d").to_string())
            .query("endDate", end.format("%Y-%m-%d").to_string())
            .query("currency", "USD/CNY")
            .query("pageNum", "1")
            .query("pageSize", "10")
            .timeout(self.timeout);

        let response: HistoryResponse = self.http.get_json(&spec).await?;
        let mut fixings: Vec<MidRateFixing> = response
            .records
            .into_iter()
            .filter_map(|record| {
                let rate = record.values.first().and_then(json_number)?;
                Some(MidRateFixing {
                    date: record.date,
                    rate: round_dp(rate, 4),
                })
            })
            .collect();

        if fixings.is_empty() {
            return Err(DataError::NoData("no USD/CNY central parity records".to_string()));
        }
        // ISO 날짜 문자열은 사전순 = 시간순
        fixings.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(count = fixings.len(), latest = %fixings[0].date, "중간가 이력 조회");
        Ok(fixings)
    }

    /// 최근 중간가 창.
    pub async fn mid_rate_window(&self, end: NaiveDate) -> Result<MidRateWindow> {
        let fixings = self.recent_fixings(end).await?;
        MidRateWindow::from_fixings(&fixings)
            .ok_or_else(|| DataError::NoData("empty central parity window".to_string()))
    }
}
