//! fetcher 수준 재시도.
//!
//! HTTP 클라이언트의 상태 코드 재시도와 별개로, 연결 오류/빈 응답/파싱 실패 같은
//! 일시적 실패를 소스 단위로 다시 시도합니다. 기본값은 3회 시도, 1초 → 2초 → 4초 간격입니다.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::DataError;

/// 재시도 설정.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (최초 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간 (이후 2배씩 증가)
    pub base_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// `attempt`번째(0부터) 실패 후 대기 시간.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// 재시도 가능한 오류에 한해 `op`를 최대 `max_attempts`번 실행합니다.
///
/// 재시도 불가 오류(자격증명 누락, 범위 밖 값 등)는 즉시 반환합니다.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                debug!(label = label, error = %e, "재시도 불가 오류");
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    warn!(label = label, attempts = attempt, error = %e, "재시도 소진");
                    return Err(e);
                }
                let delay = config.delay_for(attempt - 1);
                debug!(
                    label = label,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "재시도 예정"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
