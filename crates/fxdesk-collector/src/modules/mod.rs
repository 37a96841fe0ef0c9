//! 데이터 수집 모듈.
//!
//! 각 모듈은 DataContext의 한 구역을 채우는 `CollectStep`입니다. 모듈은 절대 실패를
//! 호출자에게 던지지 않습니다. 값을 얻지 못한 지표는 명시적 null로 기록하고,
//! 진단은 `errors`에 남긴 뒤 상태 문자열을 반환합니다.

pub mod cny_sync;
pub mod fred_sync;
pub mod global_fx_sync;
pub mod hkd_sync;
pub mod metrics;
pub mod news_sync;

pub use cny_sync::CnySync;
pub use fred_sync::FredSync;
pub use global_fx_sync::GlobalFxSync;
pub use hkd_sync::HkdSync;
pub use metrics::{calculate_metrics, MetricsStep};
pub use news_sync::NewsSync;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fxdesk_core::DataContext;
use fxdesk_data::{with_retry, DataError, FallbackChain, RetryConfig, SourcedValue, TtlCache};

/// 파이프라인의 한 단계.
#[async_trait]
pub trait CollectStep: Send + Sync {
    /// 진행 표시와 진단 라벨에 쓰는 단계 이름.
    fn name(&self) -> &str;

    /// 컨텍스트를 제자리에서 채우고 사람이 읽는 상태 문자열을 반환.
    async fn run(&self, ctx: &mut DataContext) -> String;
}

/// 모듈이 공유하는 캐시와 재시도 설정.
#[derive(Clone)]
pub struct FetchPolicy {
    pub cache: Arc<TtlCache>,
    pub retry: RetryConfig,
}

impl FetchPolicy {
    pub fn new(cache: Arc<TtlCache>, retry: RetryConfig) -> Self {
        Self { cache, retry }
    }

    /// 캐시를 거쳐 `op`를 재시도 규칙에 따라 실행.
    pub async fn cached<T, F, Fut>(&self, key: &str, ttl: Duration, op: F) -> Result<T, DataError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        self.cache
            .get_or_fetch(key, ttl, || with_retry(&self.retry, key, op))
            .await
    }

    /// 캐시를 거쳐 fallback 체인 해석.
    pub async fn resolve(
        &self,
        key: &str,
        ttl: Duration,
        chain: &FallbackChain,
    ) -> Result<SourcedValue, DataError> {
        self.cache
            .get_or_fetch(key, ttl, || chain.resolve(&self.retry))
            .await
    }
}
