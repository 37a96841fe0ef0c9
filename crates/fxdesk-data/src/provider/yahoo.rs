//! Yahoo Finance chart API 클라이언트.
//!
//! `v8/finance/chart/{symbol}` 응답에서 `regularMarketPrice`, 없으면 `previousClose`,
//! 그것도 없으면 일봉 종가 중 마지막 유효값을 사용합니다.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::QuoteSource;
use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResult {
    fn last_price(&self) -> Option<f64> {
        let from_meta = self
            .meta
            .regular_market_price
            .or(self.meta.previous_close)
            .or(self.meta.chart_previous_close)
            .filter(|v| v.is_finite() && *v != 0.0);
        from_meta.or_else(|| {
            self.indicators
                .as_ref()?
                .quote
                .first()?
                .close
                .iter()
                .rev()
                .find_map(|c| *c)
        })
    }
}

/// Yahoo Finance 클라이언트.
#[derive(Clone)]
pub struct YahooClient {
    http: Arc<HttpClient>,
    base_url: String,
    timeout: TimeoutPair,
}

impl YahooClient {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            timeout: TimeoutPair::from_secs(10, 15),
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

    /// 최근 5일 일봉 기준 최신 가격.
    pub async fn last_price(&self, symbol: &str) -> Result<f64> {
        let spec = RequestSpec::get(format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .query("interval", "1d")
            .query("range", "5d")
            .header("Accept", "application/json, text/plain, */*")
            .timeout(self.timeout);

        let response: ChartResponse = self.http.get_json(&spec).await?;
        if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
            return Err(DataError::NoData(format!("{}: {}", symbol, error)));
        }

        response
            .chart
            .result
            .as_ref()
            .and_then(|results| results.first())
            .and_then(ChartResult::last_price)
            .ok_or_else(|| DataError::NoData(format!("{}: empty chart", symbol)))
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn quote(&self, symbol: &str) -> Result<f64> {
        self.last_price(symbol).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use std::time::Duration;

    fn client(url: String) -> YahooClient {
        let http = Arc::new(HttpClient::new(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        }));
        YahooClient::new(http).with_base_url(url)
    }

    #[tokio::test]
    async fn test_meta_price_preferred() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/DX-Y.NYB")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"chart":{"result":[{"meta":{"regularMarketPrice":104.52,"previousClose":104.1},
                "indicators":{"quote":[{"close":[104.0,null]}]}}],"error":null}}"#,
            )
            .create_async()
            .await;

        assert_eq!(client(server.url()).last_price("DX-Y.NYB").await.unwrap(), 104.52);
    }

    #[tokio::test]
    async fn test_falls_back_to_last_close() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/EURUSD=X")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"chart":{"result":[{"meta":{},
                "indicators":{"quote":[{"close":[1.071,1.0734,null]}]}}],"error":null}}"#,
            )
            .create_async()
            .await;

        assert_eq!(client(server.url()).last_price("EURUSD=X").await.unwrap(), 1.0734);
    }

    #[tokio::test]
    async fn test_chart_error_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v8/finance/chart/BAD")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#)
            .create_async()
            .await;

        assert!(matches!(
            client(server.url()).last_price("BAD").await,
            Err(DataError::NoData(_))
        ));
    }
}
