//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 주기 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 실행한 단계 수
    pub steps: usize,
    /// 진단 없이 끝난 단계 수
    pub succeeded: usize,
    /// 진단을 남기고 끝난 단계 수 (일부 값 null)
    pub degraded: usize,
    /// 비정상 종료된 단계 수
    pub failed: usize,
    /// null이 아닌 값 + 뉴스 수
    pub data_points: usize,
    /// 누적 진단 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.steps as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            steps = self.steps,
            succeeded = self.succeeded,
            degraded = self.degraded,
            failed = self.failed,
            data_points = self.data_points,
            errors = self.errors,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let stats = CollectionStats {
            steps: 4,
            succeeded: 3,
            degraded: 1,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), 75.0);
        assert_eq!(CollectionStats::new().success_rate(), 0.0);
    }
}
