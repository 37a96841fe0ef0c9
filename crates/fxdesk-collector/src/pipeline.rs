//! 수집 파이프라인.
//!
//! 고정 순서의 단계 목록을 하나씩 실행합니다. 단계가 패닉하더라도 진단을 남기고
//! 다음 단계로 넘어가며, 파이프라인 자체는 중단되지 않습니다.
//!
//! 기본 순서: FRED → 인민폐 → 홍콩달러 → 글로벌 외환 → 뉴스 → 파생 지표.
//! 파생 지표 단계는 항상 마지막이므로 모든 fetcher의 최종 상태를 봅니다.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use fxdesk_core::DataContext;
use fxdesk_data::{
    CfetsClient, EastMoneyClient, FredClient, HkmaClient, HttpClient, PerplexityClient,
    QuoteSource, SearchCompletion, TtlCache, YahooClient,
};

use crate::modules::{
    CnySync, CollectStep, FetchPolicy, FredSync, GlobalFxSync, HkdSync, MetricsStep, NewsSync,
};
use crate::{CollectionStats, CollectorConfig};

/// 진행 콜백 `(단계 번호, 전체 단계 수, 메시지)`.
pub type ProgressFn<'a> = dyn FnMut(usize, usize, &str) + 'a;

pub struct Collector {
    steps: Vec<Box<dyn CollectStep>>,
    cache: Arc<TtlCache>,
    http: Arc<HttpClient>,
}

impl Collector {
    /// 빈 파이프라인.
    pub fn new(http: Arc<HttpClient>, cache: Arc<TtlCache>) -> Self {
        Self {
            steps: Vec::new(),
            cache,
            http,
        }
    }

    /// 단계 추가.
    pub fn step(mut self, step: impl CollectStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// 설정으로 기본 파이프라인 구성.
    pub fn from_config(config: &CollectorConfig) -> Self {
        let http = Arc::new(HttpClient::new(config.http_retry));
        let cache = Arc::new(TtlCache::new());
        let policy = FetchPolicy::new(cache.clone(), config.fetch_retry);
        let ttl = &config.cache_ttl;
        let timeouts = &config.timeouts;
        let endpoints = &config.endpoints;

        let fred = FredClient::new(http.clone(), config.credentials.fred_api_key.clone())
            .with_base_url(&endpoints.fred)
            .with_timeout(timeouts.fred);
        let cfets = CfetsClient::new(http.clone())
            .with_base_url(&endpoints.cfets)
            .with_timeout(timeouts.cfets);
        let board: Arc<dyn QuoteSource> = Arc::new(
            EastMoneyClient::new(http.clone(), cache.clone())
                .with_base_url(&endpoints.eastmoney)
                .with_timeout(timeouts.eastmoney)
                .with_ttl(ttl.cny_spot),
        );
        let yahoo: Arc<dyn QuoteSource> = Arc::new(
            YahooClient::new(http.clone())
                .with_base_url(&endpoints.yahoo)
                .with_timeout(timeouts.yahoo),
        );
        let hkma = HkmaClient::new(http.clone())
            .with_base_url(&endpoints.hkma)
            .with_timeout(timeouts.hkma)
            .with_insecure(config.hkma_insecure);
        let search: Arc<dyn SearchCompletion> = Arc::new(
            PerplexityClient::new(http.clone(), config.credentials.perplexity_api_key.clone())
                .with_base_url(&endpoints.perplexity)
                .with_model(&config.credentials.perplexity_model)
                .with_timeout(timeouts.perplexity)
                .with_proxy(config.proxy.clone())
                .with_insecure(config.perplexity_insecure),
        );

        Self::new(http, cache.clone())
            .step(FredSync::new(fred, policy.clone(), ttl.fred))
            .step(CnySync::new(
                cfets,
                board.clone(),
                yahoo.clone(),
                policy.clone(),
                ttl.cny_mid,
                ttl.cny_spot,
            ))
            .step(HkdSync::new(
                board.clone(),
                yahoo.clone(),
                hkma,
                policy.clone(),
                ttl.hkd,
            ))
            .step(GlobalFxSync::new(board, yahoo, policy.clone(), ttl.global_fx))
            .step(NewsSync::new(search, policy, ttl.news))
            .step(MetricsStep)
    }

    pub fn http(&self) -> Arc<HttpClient> {
        self.http.clone()
    }

    pub fn cache(&self) -> Arc<TtlCache> {
        self.cache.clone()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// 캐시 전체 비우기 (강제 새로고침).
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("캐시 초기화");
    }

    /// 새 DataContext로 한 주기 수집.
    pub async fn collect(
        &self,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> (DataContext, CollectionStats) {
        let mut ctx = DataContext::new();
        let stats = self.collect_into(&mut ctx, progress).await;
        (ctx, stats)
    }

    /// 주어진 컨텍스트에 모든 단계 실행.
    pub async fn collect_into(
        &self,
        ctx: &mut DataContext,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> CollectionStats {
        let started = Instant::now();
        let total = self.steps.len();
        let mut stats = CollectionStats::new();

        info!(steps = total, report_date = %ctx.report_date, "=== 데이터 수집 시작 ===");

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if let Some(cb) = progress.as_deref_mut() {
                cb(index, total, &format!("{}...", name));
            }

            let errors_before = ctx.errors().len();
            let outcome = AssertUnwindSafe(step.run(ctx)).catch_unwind().await;
            stats.steps += 1;

            let status = match outcome {
                Ok(status) => {
                    if ctx.errors().len() > errors_before {
                        stats.degraded += 1;
                    } else {
                        stats.succeeded += 1;
                    }
                    info!(step = name, status = %status, "단계 완료");
                    status
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(step = name, error = %message, "단계 비정상 종료");
                    ctx.push_error(name, &message);
                    stats.failed += 1;
                    format!("❌ {} 失败", name)
                }
            };

            if let Some(cb) = progress.as_deref_mut() {
                cb(index + 1, total, &status);
            }
        }

        stats.data_points = ctx.count_data_points();
        stats.errors = ctx.errors().len();
        stats.elapsed = started.elapsed();
        stats.log_summary("데이터 수집");
        stats
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
