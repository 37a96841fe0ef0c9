//! 코어 에러 타입.

use thiserror::Error;

/// DataContext 직렬화/검증 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// news / news_detail / news_sources 길이 불일치
    #[error("Misaligned news: news={news}, news_detail={detail}, news_sources={sources}")]
    MisalignedNews {
        news: usize,
        detail: usize,
        sources: usize,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
