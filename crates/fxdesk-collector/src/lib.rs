//! FX 주간 리포트 데이터 수집기.
//!
//! 이 crate는 한 리포트 주기의 데이터를 수집하는 파이프라인과 CLI를 제공합니다:
//! - 매크로 지표 (FRED), 인민폐 중간가/역외 환율, 홍콩달러/HIBOR, 글로벌 외환
//! - 검색 증강 뉴스
//! - 파생 지표 계산
//! - 리포트 생성과 수치 감사 (CLI)

pub mod config;
pub mod error;
pub mod modules;
pub mod pipeline;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use pipeline::{Collector, ProgressFn};
pub use stats::CollectionStats;
