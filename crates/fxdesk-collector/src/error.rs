//! 에러 타입 정의.

use std::fmt;

use fxdesk_audit::AuditError;
use fxdesk_core::CoreError;
use fxdesk_report::ReportError;

/// Collector 에러 타입. 바이너리 경계에서만 쓰이며, 수집 모듈은 반환하지 않습니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 파일 입출력 에러
    Io(std::io::Error),
    /// DataContext 직렬화 에러
    Context(CoreError),
    /// 감사 지표 테이블 에러
    Audit(AuditError),
    /// 리포트 생성 에러
    Report(ReportError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Context(e) => write!(f, "Data context error: {}", e),
            Self::Audit(e) => write!(f, "Audit error: {}", e),
            Self::Report(e) => write!(f, "Report error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Io(e) => Some(e),
            Self::Context(e) => Some(e),
            Self::Audit(e) => Some(e),
            Self::Report(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Context(err)
    }
}

impl From<AuditError> for CollectorError {
    fn from(err: AuditError) -> Self {
        Self::Audit(err)
    }
}

impl From<ReportError> for CollectorError {
    fn from(err: ReportError) -> Self {
        Self::Report(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
