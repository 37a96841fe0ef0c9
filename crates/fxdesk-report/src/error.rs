//! 리포트 모듈 오류 타입.

use thiserror::Error;

use fxdesk_core::CoreError;
use fxdesk_data::HttpError;

#[derive(Debug, Error)]
pub enum ReportError {
    /// chat completion 호출 실패
    #[error("chat completion failed: {0}")]
    Http(#[from] HttpError),

    /// API 키 누락
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// 응답에 본문이 없음
    #[error("empty completion: {0}")]
    EmptyCompletion(String),

    /// 아직 생성된 리포트가 없음
    #[error("no report has been generated yet")]
    NoReport,

    #[error("context error: {0}")]
    Context(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
