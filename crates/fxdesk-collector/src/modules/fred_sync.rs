//! FRED 매크로 지표 동기화 모듈.
//!
//! 미국채 10년/2년 금리, VIX, 연방기금금리를 소수점 2자리로 기록하고
//! VIX 구간에 따라 시장 심리 문구를 붙입니다.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use fxdesk_core::{round_dp, DataContext};
use fxdesk_data::FredClient;

use super::{CollectStep, FetchPolicy};

/// (FRED 시계열, macro 키, 출처 표기, 상태 라벨)
const SERIES: [(&str, &str, &str, &str); 4] = [
    ("DGS10", "us10y", "FRED", "10Y"),
    ("DGS2", "us2y", "FRED", "2Y"),
    ("VIXCLS", "vix", "CBOE/FRED", "VIX"),
    ("FEDFUNDS", "fed_rate", "FRED", "FedRate"),
];

const SENTIMENT_KEY: &str = "market_sentiment";

/// VIX 수준별 시장 심리.
pub fn market_sentiment(vix: f64) -> &'static str {
    if vix < 15.0 {
        "乐观（低恐慌）"
    } else if vix < 20.0 {
        "中性"
    } else if vix < 30.0 {
        "谨慎"
    } else {
        "恐慌"
    }
}

pub struct FredSync {
    client: FredClient,
    policy: FetchPolicy,
    ttl: Duration,
}

impl FredSync {
    pub fn new(client: FredClient, policy: FetchPolicy, ttl: Duration) -> Self {
        Self {
            client,
            policy,
            ttl,
        }
    }
}

#[async_trait]
impl CollectStep for FredSync {
    fn name(&self) -> &str {
        "FRED 宏观数据"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        if !self.client.is_configured() {
            for (_, key, _, _) in SERIES {
                ctx.macro_data.set_missing(key);
            }
            ctx.macro_data.set_missing(SENTIMENT_KEY);
            ctx.push_error("FRED", "FRED_API_KEY 未配置");
            warn!("FRED API 키 없음, 매크로 지표 건너뜀");
            return "⚠️ FRED 未配置".to_string();
        }

        let mut fetched = Vec::new();
        for (series, key, source, label) in SERIES {
            let cache_key = format!("fred:{}", series);
            let result = self
                .policy
                .cached(&cache_key, self.ttl, || self.client.latest_observation(series))
                .await;

            match result {
                Ok(value) => {
                    let value = round_dp(value, 2);
                    ctx.macro_data.set_number(key, value);
                    ctx.record_source(key, source);
                    fetched.push(label);
                    info!(series = series, value = value, "FRED 지표 수집");
                }
                Err(e) => {
                    ctx.macro_data.set_missing(key);
                    ctx.push_error(&label.to_uppercase(), e.to_string());
                    warn!(series = series, error = %e, "FRED 지표 수집 실패");
                }
            }
        }

        match ctx.macro_data.number("vix") {
            Some(vix) => ctx.macro_data.set_text(SENTIMENT_KEY, market_sentiment(vix)),
            None => ctx.macro_data.set_missing(SENTIMENT_KEY),
        }

        if fetched.is_empty() {
            "⚠️ FRED 数据缺失".to_string()
        } else {
            format!("✅ FRED: {}", fetched.join(", "))
        }
    }
}
