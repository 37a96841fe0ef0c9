//! 홍콩금융관리국(HKMA) HIBOR 클라이언트.
//!
//! 일별 은행간 금리 통계의 최신 레코드에서 익일물, 1주, 1개월 HIBOR를 읽습니다.
//! HKMA 엔드포인트는 가로채기 프록시 뒤에서 호출되는 경우가 있어 인증서 검증을
//! 요청 단위로 해제합니다.

use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::json_number;
use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_HKMA_BASE_URL: &str = "https://api.hkma.gov.hk";

pub const PROVIDER_NAME: &str = "香港金管局";

const HIBOR_PATH: &str =
    "/public/market-data-and-statistics/monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily";

/// 최신 HIBOR 고시. 레코드에 없는 만기는 None.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HiborFixing {
    pub date: Option<String>,
    pub overnight: Option<f64>,
    pub one_week: Option<f64>,
    pub one_month: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HkmaResponse {
    result: Option<HkmaResult>,
}

#[derive(Debug, Deserialize)]
struct HkmaResult {
    #[serde(default)]
    records: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// HKMA API 클라이언트.
#[derive(Clone)]
pub struct HkmaClient {
    http: Arc<HttpClient>,
    base_url: String,
    timeout: TimeoutPair,
    insecure: bool,
}

impl HkmaClient {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            base_url: DEFAULT_HKMA_BASE_URL.to_string(),
            timeout: TimeoutPair::from_secs(10, 20),
            insecure: true,
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

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// 최신 HIBOR 레코드.
    pub async fn latest_hibor(&self) -> Result<HiborFixing> {
        let spec = RequestSpec::get(format!("{}{}", self.base_url, HIBOR_PATH))
            .query("sortby", "end_of_day")
            .query("sortorder", "desc")
            .query("pagesize", "5")
            .timeout(self.timeout)
            .insecure(self.insecure);

        let response: HkmaResponse = self.http.get_json(&spec).await?;
        let latest = response
            .result
            .and_then(|r| r.records.into_iter().next())
            .ok_or_else(|| DataError::NoData("HKMA returned no HIBOR records".to_string()))?;

        let field = |name: &str| latest.get(name).and_then(json_number);
        let fixing = HiborFixing {
            date: latest
                .get("end_of_day")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            overnight: field("ir_overnight"),
            one_week: field("ir_1w").or_else(|| field("ir_1week")),
            one_month: field("ir_1m").or_else(|| field("ir_1month")),
        };

        if fixing.overnight.is_none() && fixing.one_week.is_none() && fixing.one_month.is_none() {
            return Err(DataError::NoData("HIBOR record has no rates".to_string()));
        }
        debug!(date = ?fixing.date, overnight = ?fixing.overnight, "HIBOR 조회");
        Ok(fixing)
    }
}
