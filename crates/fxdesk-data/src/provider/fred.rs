//! FRED 시계열 클라이언트.
//!
//! `series/observations`를 최신순으로 조회해 첫 번째 유효 관측값을 돌려줍니다.
//! FRED는 결측 관측을 `"."`로 표기하므로 건너뜁니다.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{json_number, QuoteSource};
use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";

/// 최신 관측값 탐색 범위.
const OBSERVATION_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(default)]
    date: String,
    value: serde_json::Value,
}

/// FRED API 클라이언트.
#[derive(Clone)]
pub struct FredClient {
    http: Arc<HttpClient>,
    api_key: Option<SecretString>,
    base_url: String,
    timeout: TimeoutPair,
}

impl FredClient {
    pub fn new(http: Arc<HttpClient>, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_FRED_BASE_URL.to_string(),
            timeout: TimeoutPair::from_secs(10, 30),
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

    /// API 키 설정 여부.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// 시계열의 최신 유효 관측값.
    pub async fn latest_observation(&self, series_id: &str) -> Result<f64> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DataError::MissingCredential("FRED_API_KEY".to_string()))?;

        let spec = RequestSpec::get(format!("{}/fred/series/observations", self.base_url))
            .query("series_id", series_id)
            .query("api_key", api_key.expose_secret())
            .query("file_type", "json")
            .query("sort_order", "desc")
            .query("limit", OBSERVATION_LIMIT.to_string())
            .timeout(self.timeout);

        let response: ObservationsResponse = self.http.get_json(&spec).await?;
        let latest = response
            .observations
            .iter()
            .find_map(|obs| json_number(&obs.value).map(|v| (obs.date.as_str(), v)));

        match latest {
            Some((date, value)) => {
                debug!(series = series_id, date = date, value = value, "FRED 관측값");
                Ok(value)
            }
            None => Err(DataError::NoData(format!("{} has no valid observation", series_id))),
        }
    }
}

#[async_trait]
impl QuoteSource for FredClient {
    fn name(&self) -> &str {
        "FRED"
    }

    async fn quote(&self, symbol: &str) -> Result<f64> {
        self.latest_observation(symbol).await
    }
}
