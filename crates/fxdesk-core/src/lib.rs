//! # FxDesk Core
//!
//! 외환 주간 리포트 파이프라인의 핵심 데이터 모델을 제공합니다.
//!
//! - `DataContext`: 한 리포트 주기 동안 모든 데이터 소스의 결과가 병합되는 집계 레코드
//! - `Section` / `IndicatorValue`: null을 명시적으로 보존하는 지표 맵
//! - 숫자 반올림, 문자열 절단 유틸리티
//! - tracing 기반 로깅 초기화

pub mod context;
pub mod error;
pub mod logging;
pub mod numeric;
pub mod section;

pub use context::{DataContext, GroundTruth, NewsEntry, SectionKind, MAX_NEWS_URLS};
pub use error::{CoreError, Result};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use numeric::{round_dp, truncate_chars};
pub use section::{IndicatorValue, Section};
