//! 데이터 모듈 오류 타입.

use thiserror::Error;

use fxdesk_core::truncate_chars;

/// `HttpError` 메시지 최대 길이 (문자 수).
pub const HTTP_ERROR_MAX_CHARS: usize = 120;

/// 외부 HTTP 호출 실패. 연결 오류, 비성공 상태 코드, 잘못된 응답 본문을 모두 이 타입으로 전달합니다.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// 응답 상태 코드 (연결 단계 실패면 None)
    pub status: Option<u16>,
    /// 잘린 오류 메시지
    pub message: String,
}

impl HttpError {
    pub fn new(status: Option<u16>, message: impl AsRef<str>) -> Self {
        Self {
            status,
            message: truncate_chars(message.as_ref(), HTTP_ERROR_MAX_CHARS),
        }
    }

    /// 응답 본문 파싱 실패.
    pub fn malformed(message: impl std::fmt::Display) -> Self {
        Self::new(None, format!("malformed response: {}", message))
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if err.is_timeout() {
            Self::new(status, format!("timeout: {}", err))
        } else if err.is_connect() {
            Self::new(status, format!("connect: {}", err))
        } else {
            Self::new(status, err.to_string())
        }
    }
}

/// 데이터 수집 관련 오류.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// HTTP 호출 실패
    #[error("{0}")]
    Http(#[from] HttpError),

    /// API 키 등 자격증명 누락
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// 응답 형식이 예상과 다름
    #[error("parse error: {0}")]
    Parse(String),

    /// 응답은 정상이지만 쓸 수 있는 값이 없음
    #[error("no data: {0}")]
    NoData(String),

    /// 제공자 규약상 허용 범위를 벗어난 값
    #[error("value {value} outside plausible range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// 모든 fallback 소스 실패
    #[error("all sources failed: {0}")]
    Exhausted(String),

    /// 잘못된 설정
    #[error("configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// 같은 소스를 다시 시도할 가치가 있는지.
    ///
    /// 자격증명 누락, 설정 오류, 범위 밖 값, 429 이외의 4xx는 재시도해도 결과가 같습니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Http(e) => match e.status {
                Some(status) => status == 429 || status >= 500,
                None => true,
            },
            DataError::Parse(_) | DataError::NoData(_) => true,
            DataError::MissingCredential(_)
            | DataError::OutOfRange { .. }
            | DataError::Exhausted(_)
            | DataError::Config(_) => false,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_truncates_message() {
        let err = HttpError::new(Some(502), "e".repeat(500));
        assert_eq!(err.message.chars().count(), HTTP_ERROR_MAX_CHARS);
        assert!(err.to_string().starts_with("HTTP 502: "));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(DataError::Http(HttpError::new(Some(503), "x")).is_retryable());
        assert!(DataError::Http(HttpError::new(Some(429), "x")).is_retryable());
        assert!(DataError::Http(HttpError::new(None, "reset")).is_retryable());
        assert!(!DataError::Http(HttpError::new(Some(404), "x")).is_retryable());
        assert!(!DataError::MissingCredential("FRED_API_KEY".into()).is_retryable());
        assert!(!DataError::OutOfRange {
            value: 120.0,
            min: 90.0,
            max: 115.0
        }
        .is_retryable());
        assert!(DataError::Parse("bad json".into()).is_retryable());
    }
}
