//! 홍콩달러 데이터 동기화 모듈.
//!
//! USD/HKD는 동방재부 보드를 먼저 보고, 실패하면 Yahoo HKDUSD=X를 역수로 씁니다.
//! 두 소스 모두 연계환율 밴드 부근(7.7~7.9)을 벗어난 값은 실패로 처리합니다.
//! HIBOR는 HKMA 일별 고시에서 가져옵니다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use fxdesk_core::DataContext;
use fxdesk_data::provider::hkma::PROVIDER_NAME as HKMA_NAME;
use fxdesk_data::{ChainLink, FallbackChain, HkmaClient, QuoteSource};

use super::{CollectStep, FetchPolicy};

const USDHKD_MIN: f64 = 7.7;
const USDHKD_MAX: f64 = 7.9;

const HIBOR_KEYS: [&str; 3] = ["hibor_overnight", "hibor_1w", "hibor_1m"];

/// 연계환율 밴드 안에서의 위치.
pub fn lers_position(usdhkd: f64) -> &'static str {
    if usdhkd <= 7.77 {
        "强方区间（接近7.75强方保证）"
    } else if usdhkd >= 7.83 {
        "弱方区间（接近7.85弱方保证）"
    } else {
        "中间区间"
    }
}

pub struct HkdSync {
    spot_chain: FallbackChain,
    hkma: HkmaClient,
    policy: FetchPolicy,
    ttl: Duration,
}

impl HkdSync {
    pub fn new(
        board: Arc<dyn QuoteSource>,
        yahoo: Arc<dyn QuoteSource>,
        hkma: HkmaClient,
        policy: FetchPolicy,
        ttl: Duration,
    ) -> Self {
        let spot_chain = FallbackChain::new("USD/HKD")
            .link(ChainLink::new(board, "USDHKD").within(USDHKD_MIN, USDHKD_MAX))
            .link(
                ChainLink::new(yahoo, "HKDUSD=X")
                    .inverted()
                    .rounded(4)
                    .within(USDHKD_MIN, USDHKD_MAX),
            );
        Self {
            spot_chain,
            hkma,
            policy,
            ttl,
        }
    }
}

#[async_trait]
impl CollectStep for HkdSync {
    fn name(&self) -> &str {
        "港元数据"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        match self.policy.resolve("hkd:spot", self.ttl, &self.spot_chain).await {
            Ok(spot) => {
                ctx.hkd.set_number("usdhkd", spot.value);
                ctx.hkd.set_text("lers_position", lers_position(spot.value));
                ctx.record_source("usdhkd", spot.source);
            }
            Err(e) => {
                ctx.hkd.set_missing("usdhkd");
                ctx.hkd.set_missing("lers_position");
                ctx.push_error("USD/HKD", e.to_string());
                warn!(error = %e, "USD/HKD 수집 실패");
            }
        }

        match self
            .policy
            .cached("hkd:hibor", self.ttl, || self.hkma.latest_hibor())
            .await
        {
            Ok(fixing) => {
                ctx.hkd.set_optional("hibor_overnight", fixing.overnight);
                ctx.hkd.set_optional("hibor_1w", fixing.one_week);
                ctx.hkd.set_optional("hibor_1m", fixing.one_month);
                ctx.record_source("hibor", HKMA_NAME);
            }
            Err(e) => {
                for key in HIBOR_KEYS {
                    ctx.hkd.set_missing(key);
                }
                ctx.push_error("HIBOR", e.to_string());
                warn!(error = %e, "HIBOR 수집 실패");
            }
        }

        let usdhkd = ctx.hkd.number("usdhkd");
        let hibor = ctx.hkd.number("hibor_overnight");
        match (usdhkd, hibor) {
            (None, None) => "⚠️ 港元数据缺失".to_string(),
            (spot, hibor) => {
                let mut status = format!(
                    "✅ 港元: {}",
                    spot.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
                );
                if let Some(h) = hibor {
                    status.push_str(&format!(", HIBOR:{}%", h));
                }
                status
            }
        }
    }
}
