//! 글로벌 외환 동기화 모듈.
//!
//! 주요 통화쌍 6개와 ICE 달러지수(DXY)를 수집합니다. DXY는 제공자마다 다른 지수를
//! 같은 이름으로 부르므로, ICE 규약 범위(90~115) 밖의 값은 받지 않습니다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use fxdesk_core::DataContext;
use fxdesk_data::{ChainLink, FallbackChain, QuoteSource};

use super::{CollectStep, FetchPolicy};

/// (보드 코드, global_fx 키)
pub const MAJOR_PAIRS: [(&str, &str); 6] = [
    ("EURUSD", "eurusd"),
    ("USDJPY", "usdjpy"),
    ("GBPUSD", "gbpusd"),
    ("AUDUSD", "audusd"),
    ("USDCAD", "usdcad"),
    ("USDCHF", "usdchf"),
];

const DXY_MIN: f64 = 90.0;
const DXY_MAX: f64 = 115.0;

pub struct GlobalFxSync {
    pairs: Vec<(&'static str, &'static str, FallbackChain)>,
    dxy_chain: FallbackChain,
    policy: FetchPolicy,
    ttl: Duration,
}

impl GlobalFxSync {
    pub fn new(
        board: Arc<dyn QuoteSource>,
        yahoo: Arc<dyn QuoteSource>,
        policy: FetchPolicy,
        ttl: Duration,
    ) -> Self {
        let pairs = MAJOR_PAIRS
            .iter()
            .map(|(code, key)| {
                let chain = FallbackChain::new(*code)
                    .link(ChainLink::new(board.clone(), *code))
                    .link(ChainLink::new(yahoo.clone(), format!("{}=X", code)).rounded(4));
                (*code, *key, chain)
            })
            .collect();

        let dxy_chain = FallbackChain::new("DXY")
            .link(
                ChainLink::new(yahoo, "DX-Y.NYB")
                    .rounded(2)
                    .within(DXY_MIN, DXY_MAX),
            )
            .link(
                ChainLink::new(board, "美元指数")
                    .rounded(2)
                    .within(DXY_MIN, DXY_MAX),
            );

        Self {
            pairs,
            dxy_chain,
            policy,
            ttl,
        }
    }
}

#[async_trait]
impl CollectStep for GlobalFxSync {
    fn name(&self) -> &str {
        "全球外汇"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        let mut found = Vec::new();

        for (code, key, chain) in &self.pairs {
            let cache_key = format!("global_fx:{}", key);
            match self.policy.resolve(&cache_key, self.ttl, chain).await {
                Ok(quote) => {
                    ctx.global_fx.set_number(*key, quote.value);
                    ctx.record_source(*key, quote.source);
                    found.push(*code);
                }
                Err(e) => {
                    ctx.global_fx.set_missing(*key);
                    ctx.push_error(code, e.to_string());
                    warn!(pair = *code, error = %e, "통화쌍 수집 실패");
                }
            }
        }

        match self
            .policy
            .resolve("global_fx:dxy", self.ttl, &self.dxy_chain)
            .await
        {
            Ok(dxy) => {
                ctx.global_fx.set_number("dxy", dxy.value);
                ctx.record_source("dxy", dxy.source);
                found.push("DXY");
            }
            Err(e) => {
                ctx.global_fx.set_missing("dxy");
                ctx.push_error("DXY", e.to_string());
                warn!(error = %e, "달러지수 수집 실패");
            }
        }

        if found.is_empty() {
            "⚠️ 全球外汇数据缺失".to_string()
        } else {
            format!("✅ 全球外汇: {}", found.join(", "))
        }
    }
}
