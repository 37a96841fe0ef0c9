//! 감사 모듈 오류 타입.

use thiserror::Error;

/// 지표 테이블 로드/검증 오류.
#[derive(Debug, Error)]
pub enum AuditError {
    /// 설정 파일 읽기/역직렬화 실패
    #[error("failed to load indicator table: {0}")]
    Load(#[from] config::ConfigError),

    /// 음수 또는 유한하지 않은 허용 오차
    #[error("indicator '{name}' has invalid tolerance {tolerance}")]
    InvalidTolerance { name: String, tolerance: f64 },

    /// 키워드 없음
    #[error("indicator '{0}' has no keywords")]
    EmptyKeywords(String),

    /// 필드명 없음
    #[error("indicator '{0}' has no ground-truth field")]
    EmptyField(String),

    /// 지표가 하나도 없음
    #[error("indicator table is empty")]
    EmptyTable,
}

pub type Result<T> = std::result::Result<T, AuditError>;
