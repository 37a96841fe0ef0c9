//! 인민폐 데이터 동기화 모듈.
//!
//! - 중간가: CFETS 최근 고시 (최신값, 고시일, 최근 5회 고저)
//! - 역외 CNH: 동방재부 보드 → Yahoo

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use fxdesk_core::DataContext;
use fxdesk_data::provider::cfets::PROVIDER_NAME as CFETS_NAME;
use fxdesk_data::{CfetsClient, ChainLink, FallbackChain, QuoteSource};

use super::{CollectStep, FetchPolicy};

/// 중간가 실패 시 null로 남기는 키 (성공 시 기록하는 키 전부).
const MID_KEYS: [&str; 5] = [
    "usdcny_mid",
    "usdcny_mid_date",
    "usdcny_mid_high",
    "usdcny_mid_low",
    "usdcny_mid_range",
];

pub struct CnySync {
    cfets: CfetsClient,
    spot_chain: FallbackChain,
    policy: FetchPolicy,
    mid_ttl: Duration,
    spot_ttl: Duration,
}

impl CnySync {
    /// `board`: 동방재부 보드, `yahoo`: 보조 시세 소스
    pub fn new(
        cfets: CfetsClient,
        board: Arc<dyn QuoteSource>,
        yahoo: Arc<dyn QuoteSource>,
        policy: FetchPolicy,
        mid_ttl: Duration,
        spot_ttl: Duration,
    ) -> Self {
        let spot_chain = FallbackChain::new("USD/CNH")
            .link(ChainLink::new(board, "USDCNH"))
            .link(ChainLink::new(yahoo, "CNH=X").rounded(4));
        Self {
            cfets,
            spot_chain,
            policy,
            mid_ttl,
            spot_ttl,
        }
    }
}

/// 리포트 날짜 기준일 (파싱 실패 시 오늘).
pub(crate) fn report_day(ctx: &DataContext) -> NaiveDate {
    NaiveDate::parse_from_str(&ctx.report_date, "%Y-%m-%d")
        .unwrap_or_else(|_| chrono::Utc::now().date_naive())
}

#[async_trait]
impl CollectStep for CnySync {
    fn name(&self) -> &str {
        "人民币数据"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        let end = report_day(ctx);
        let mid = self
            .policy
            .cached("cny:mid", self.mid_ttl, || self.cfets.mid_rate_window(end))
            .await;

        match mid {
            Ok(window) => {
                ctx.cny.set_number("usdcny_mid", window.latest.rate);
                ctx.cny.set_text("usdcny_mid_date", window.latest.date.clone());
                ctx.cny.set_number("usdcny_mid_high", window.high);
                ctx.cny.set_number("usdcny_mid_low", window.low);
                ctx.cny.set_text("usdcny_mid_range", window.range_label());
                ctx.record_source("usdcny_mid", CFETS_NAME);
            }
            Err(e) => {
                for key in MID_KEYS {
                    ctx.cny.set_missing(key);
                }
                ctx.push_error("人民币中间价", e.to_string());
                warn!(error = %e, "중간가 수집 실패");
            }
        }

        match self
            .policy
            .resolve("cny:spot", self.spot_ttl, &self.spot_chain)
            .await
        {
            Ok(spot) => {
                ctx.cny.set_number("usdcnh_spot", spot.value);
                ctx.record_source("usdcnh", spot.source);
            }
            Err(e) => {
                ctx.cny.set_missing("usdcnh_spot");
                ctx.push_error("离岸汇率", e.to_string());
                warn!(error = %e, "역외 CNH 수집 실패");
            }
        }

        let mut parts = Vec::new();
        if let Some(mid) = ctx.cny.number("usdcny_mid") {
            parts.push(format!("中间价:{}", mid));
        }
        if let Some(spot) = ctx.cny.number("usdcnh_spot") {
            parts.push(format!("CNH:{}", spot));
        }

        if parts.len() == 2 {
            format!("✅ 人民币: {}", parts.join(", "))
        } else if parts.is_empty() {
            "⚠️ 人民币数据缺失".to_string()
        } else {
            format!("⚠️ 人民币数据部分缺失: {}", parts.join(", "))
        }
    }
}
