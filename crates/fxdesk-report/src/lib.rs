//! 리포트 생성 경계.
//!
//! 수집된 DataContext를 엄격한 프롬프트와 함께 chat completion 모델에 넘기고,
//! 돌아온 본문을 수치 감사 엔진으로 검증합니다.
//!
//! - [`client`]: `ChatClient` trait과 OpenAI 호환 DeepSeek 구현
//! - [`prompts`]: null → "数据暂缺" 치환, 리포트/추가질문 프롬프트
//! - [`anchors`]: 역사적 기준점
//! - [`generator`]: 리포트 생성, 추가 질문, 감사, 데이터 요약

pub mod anchors;
pub mod client;
pub mod error;
pub mod generator;
pub mod prompts;

pub use anchors::{default_history_anchors, HistoryAnchor};
pub use client::{ChatClient, ChatMessage, ChatRequest, DeepSeekClient, DeepSeekConfig};
pub use error::{ReportError, Result};
pub use generator::{GenerationSettings, ReportGenerator};
pub use prompts::{followup_prompt, replace_nulls, report_prompt, PromptPair, MISSING_PLACEHOLDER};
