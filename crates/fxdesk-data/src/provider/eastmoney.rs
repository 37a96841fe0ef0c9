//! 동방재부(东方财富) 외환 보드 클라이언트.
//!
//! 외환 시세 보드 전체를 한 번에 받아 코드(`f12`)나 이름(`f14`)으로 조회합니다.
//! USDCNH, USDHKD, 주요 통화쌍, 달러지수가 모두 같은 보드에서 나오므로 보드는
//! 공유 `TtlCache`에 `eastmoney:board` 키로 저장합니다.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{json_number, QuoteSource};
use crate::cache::TtlCache;
use crate::error::{DataError, Result};
use crate::http::{HttpClient, RequestSpec, TimeoutPair};

pub const DEFAULT_EASTMONEY_BASE_URL: &str = "https://push2.eastmoney.com";

pub const PROVIDER_NAME: &str = "东方财富";

const BOARD_CACHE_KEY: &str = "eastmoney:board";

/// 외환 보드 시장 필터 (기본 환율, 교차 환율, 역외 CNH).
const BOARD_MARKETS: &str = "m:119,m:120,m:133";

/// 보드의 한 행.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuote {
    pub code: String,
    pub name: String,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BoardResponse {
    data: Option<BoardData>,
}

#[derive(Debug, Deserialize)]
struct BoardData {
    #[serde(default)]
    diff: BoardRows,
}

/// `diff`는 배열 또는 `{"0": {...}, "1": {...}}` 형태로 내려옵니다.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BoardRows {
    List(Vec<BoardRow>),
    Map(std::collections::BTreeMap<String, BoardRow>),
}

impl Default for BoardRows {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl BoardRows {
    fn into_vec(self) -> Vec<BoardRow> {
        match self {
            Self::List(rows) => rows,
            Self::Map(rows) => rows.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BoardRow {
    #[serde(default)]
    f12: serde_json::Value,
    #[serde(default)]
    f14: serde_json::Value,
    #[serde(default)]
    f2: serde_json::Value,
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 보드에서 심볼 검색. 코드(대소문자 무시) 포함 여부를 먼저 보고, 없으면 이름을 봅니다.
pub fn find_quote<'a>(board: &'a [BoardQuote], symbol: &str) -> Option<&'a BoardQuote> {
    let needle = symbol.to_uppercase();
    board
        .iter()
        .find(|q| q.code.to_uppercase() == needle)
        .or_else(|| board.iter().find(|q| q.code.to_uppercase().contains(&needle)))
        .or_else(|| board.iter().find(|q| q.name.contains(symbol)))
}

/// 동방재부 외환 보드 클라이언트.
#[derive(Clone)]
pub struct EastMoneyClient {
    http: Arc<HttpClient>,
    cache: Arc<TtlCache>,
    base_url: String,
    timeout: TimeoutPair,
    ttl: Duration,
}

impl EastMoneyClient {
    pub fn new(http: Arc<HttpClient>, cache: Arc<TtlCache>) -> Self {
        Self {
            http,
            cache,
            base_url: DEFAULT_EASTMONEY_BASE_URL.to_string(),
            timeout: TimeoutPair::from_secs(10, 20),
            ttl: Duration::from_secs(60),
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

    /// 보드 캐시 유효 기간.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn fetch_board(&self) -> Result<Arc<Vec<BoardQuote>>> {
        let spec = RequestSpec::get(format!("{}/api/qt/clist/get", self.base_url))
            .query("pn", "1")
            .query("pz", "500")
            .query("po", "1")
            .query("np", "1")
            .query("fltt", "2")
            .query("invt", "2")
            .query("fid", "f3")
            .query("fs", BOARD_MARKETS)
            .query("fields", "f2,f12,f14")
            .timeout(self.timeout);

        let response: BoardResponse = self.http.get_json(&spec).await?;
        let rows = response
            .data
            .map(|data| data.diff.into_vec())
            .unwrap_or_default();

        let board: Vec<BoardQuote> = rows
            .into_iter()
            .map(|row| BoardQuote {
                code: json_text(&row.f12),
                name: json_text(&row.f14),
                price: json_number(&row.f2),
            })
            .filter(|q| !q.code.is_empty())
            .collect();

        if board.is_empty() {
            return Err(DataError::NoData("empty FX board".to_string()));
        }
        debug!(rows = board.len(), "외환 보드 조회");
        Ok(Arc::new(board))
    }

    /// 외환 보드 (캐시 경유).
    pub async fn board(&self) -> Result<Arc<Vec<BoardQuote>>> {
        self.cache
            .get_or_fetch(BOARD_CACHE_KEY, self.ttl, || self.fetch_board())
            .await
    }
}

#[async_trait]
impl QuoteSource for EastMoneyClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn quote(&self, symbol: &str) -> Result<f64> {
        let board = self.board().await?;
        let quote = find_quote(&board, symbol)
            .ok_or_else(|| DataError::NoData(format!("{} not on FX board", symbol)))?;
        quote
            .price
            .ok_or_else(|| DataError::NoData(format!("{} has no price", quote.code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;

    const BOARD: &str = r#"{"rc":0,"data":{"total":4,"diff":[
        {"f2":7.2563,"f12":"USDCNH","f14":"美元兑离岸人民币"},
        {"f2":7.8105,"f12":"USDHKD","f14":"美元兑港币"},
        {"f2":"-","f12":"USDCHF","f14":"美元兑瑞郎"},
        {"f2":104.37,"f12":"UDI","f14":"美元指数"}
    ]}}"#;

    fn client(url: String) -> EastMoneyClient {
        let http = Arc::new(HttpClient::new(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        }));
        EastMoneyClient::new(http, Arc::new(TtlCache::new())).with_base_url(url)
    }

    #[tokio::test]
    async fn test_board_lookup_by_code_and_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/qt/clist/get")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(BOARD)
            .expect(1)
            .create_async()
            .await;

        let client = client(server.url());
        assert_eq!(client.quote("USDCNH").await.unwrap(), 7.2563);
        assert_eq!(client.quote("usdhkd").await.unwrap(), 7.8105);
        assert_eq!(client.quote("美元指数").await.unwrap(), 104.37);

        // 세 번 조회해도 보드는 한 번만 받음
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_placeholder_price_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/qt/clist/get")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(BOARD)
            .create_async()
            .await;

        let client = client(server.url());
        assert!(matches!(client.quote("USDCHF").await, Err(DataError::NoData(_))));
        assert!(matches!(client.quote("EURUSD").await, Err(DataError::NoData(_))));
    }

    #[tokio::test]
    async fn test_empty_board_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/qt/clist/get")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"rc":0,"data":null}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client(server.url());
        assert!(client.board().await.is_err());
        assert!(client.board().await.is_err());
        mock.assert_async().await;
    }

    #[test]
    fn test_map_shaped_diff() {
        let json = r#"{"data":{"diff":{"0":{"f2":1.0712,"f12":"EURUSD","f14":"欧元兑美元"}}}}"#;
        let response: BoardResponse = serde_json::from_str(json).unwrap();
        let rows = response.data.unwrap().diff.into_vec();
        assert_eq!(rows.len(), 1);
    }
}
