//! 검색 증강 뉴스.
//!
//! 분류별 검색 프롬프트 생성(`prompts`)과 응답 텍스트 파싱(`parser`)을 담당합니다.
//! 실제 호출은 `SearchCompletion` 구현체가 수행합니다.

pub mod parser;
pub mod prompts;

pub use parser::parse_news_response;
pub use prompts::{build_request, default_requests};

use fxdesk_core::NewsEntry;

/// 뉴스 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewsCategory {
    /// 중앙은행 정책, 통화쌍 분석
    Policy,
    /// 지정학, 거시 이벤트
    Macro,
    /// 인민폐/홍콩달러 전문
    Cny,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 3] = [Self::Policy, Self::Macro, Self::Cny];

    /// 응답 텍스트의 항목 태그.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Policy => "POLICY",
            Self::Macro => "MACRO",
            Self::Cny => "CNY",
        }
    }

    /// 통계 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Policy => "政策",
            Self::Macro => "宏观",
            Self::Cny => "人民币",
        }
    }
}

impl std::fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// 파싱된 뉴스 한 건.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub category: NewsCategory,
    pub title: String,
    pub summary: String,
    pub urls: Vec<String>,
}

impl NewsItem {
    /// DataContext 항목으로 변환 (`"[TAG] 제목"`).
    pub fn into_entry(self) -> NewsEntry {
        NewsEntry {
            title: format!("[{}] {}", self.category.tag(), self.title),
            detail: self.summary,
            urls: self.urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_entry_prefixes_tag() {
        let item = NewsItem {
            category: NewsCategory::Cny,
            title: "离岸人民币走弱".to_string(),
            summary: "summary".to_string(),
            urls: vec!["https://a.example".to_string()],
        };
        let entry = item.into_entry();
        assert_eq!(entry.title, "[CNY] 离岸人民币走弱");
        assert_eq!(entry.detail, "summary");
        assert_eq!(entry.urls.len(), 1);
    }
}
