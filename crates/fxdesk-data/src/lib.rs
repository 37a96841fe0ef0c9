//! 외부 데이터 제공자 접근 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 상태 코드 기반 재시도와 제공자별 타임아웃을 갖춘 HTTP 클라이언트
//! - fetcher 수준 지수 백오프 재시도
//! - 키 기반 TTL 캐시
//! - 데이터 제공자 (FRED, CFETS 중간가, 동방재부 외환 보드, Yahoo, HKMA, Perplexity)
//! - 고정 순서 fallback 체인
//! - 검색 증강 뉴스 프롬프트와 응답 파서

pub mod cache;
pub mod error;
pub mod http;
pub mod news;
pub mod provider;
pub mod retry;

pub use cache::{CacheStats, TtlCache};
pub use error::{DataError, HttpError, Result};
pub use http::{HttpClient, HttpResponse, RequestSpec, RetryPolicy, TimeoutPair};
pub use retry::{with_retry, RetryConfig};
pub use news::{NewsCategory, NewsItem};
pub use provider::{
    CfetsClient, ChainLink, EastMoneyClient, FallbackChain, FredClient, HiborFixing, HkmaClient,
    MidRateWindow, PerplexityClient, PlausibleRange, QuoteSource, SearchCompletion, SearchRequest,
    SearchResponse, SourcedValue, YahooClient,
};
