//! 생성된 리포트 본문의 수치 감사.
//!
//! 이 crate는 다음을 제공합니다:
//! - 지표 기술자 테이블 (키워드, 필드, 허용 오차, 분류)
//! - 키워드 앵커 기반 수치 추출
//! - 허용 오차 밴드 비교와 감사 리포트
//!
//! 감사 불일치(`FAIL`)는 오류가 아니라 정상적인 결과입니다.

pub mod engine;
pub mod error;
pub mod extract;
pub mod indicator;

pub use engine::{AuditEngine, AuditRecord, AuditReport, AuditStatus, AuditSummary};
pub use error::{AuditError, Result};
pub use extract::{extract_candidate, DEFAULT_WINDOW_CHARS};
pub use indicator::{default_indicators, IndicatorCategory, IndicatorDescriptor, IndicatorTable};
