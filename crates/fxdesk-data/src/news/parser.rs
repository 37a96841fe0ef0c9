//! 검색 응답 텍스트 파서.
//!
//! 응답은 느슨하게 구조화된 자연어입니다:
//!
//! ```text
//! 1. [POLICY]
//! TITLE: Fed signals patience [1]
//! SUMMARY: The Fed held rates ... [1][3]
//! ```
//!
//! 번호+분류 태그로 항목을 나누고, 각 항목에서 TITLE/SUMMARY(또는 标题/摘要) 라벨을
//! 대소문자 구분 없이 찾습니다. `[n]` 인용 표시는 인용 목록의 1부터 시작하는 위치이며
//! 항목당 최대 2개 URL만 남깁니다. 제목을 찾지 못한 항목은 버립니다.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{NewsCategory, NewsItem};
use fxdesk_core::MAX_NEWS_URLS;

static ITEM_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*[.、)）]\s*\[\s*(POLICY|MACRO|CNY)\s*\]").expect("valid item regex")
});

static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)(?:TITLE|标题)[\s*#]*[:：]?[\s*]*(.+?)\s*(?:^[*#\s]*(?:SUMMARY|摘要)|\z)")
        .expect("valid title regex")
});

static SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^[*#\s]*(?:SUMMARY|摘要)[\s*#]*[:：]?[\s*]*(.+)").expect("valid summary regex")
});

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("valid citation regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// 인용 표시 제거, 공백 정리, 앞뒤 마크다운 기호 제거.
fn clean_text(text: &str) -> String {
    let without_refs = CITATION.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(&without_refs, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '#')
        .to_string()
}

/// 항목 본문의 `[n]`을 인용 목록으로 해석. 범위 밖 번호와 http가 아닌 항목은 건너뜁니다.
fn resolve_citations(body: &str, citations: &[String]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for caps in CITATION.captures_iter(body) {
        let Some(index) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            continue;
        };
        if index == 0 || index > citations.len() {
            continue;
        }
        let url = citations[index - 1].trim();
        if !url.starts_with("http") || urls.iter().any(|u| u == url) {
            continue;
        }
        urls.push(url.to_string());
        if urls.len() == MAX_NEWS_URLS {
            break;
        }
    }
    urls
}

fn parse_item(body: &str, citations: &[String], category: NewsCategory) -> Option<NewsItem> {
    let title = TITLE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())?;

    let summary = SUMMARY
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| title.clone());

    Some(NewsItem {
        category,
        title,
        summary,
        urls: resolve_citations(body, citations),
    })
}

/// 검색 응답을 뉴스 항목으로 파싱.
///
/// `citations`는 서비스가 돌려준 순서 그대로여야 합니다.
pub fn parse_news_response(content: &str, citations: &[String], category: NewsCategory) -> Vec<NewsItem> {
    let headers: Vec<(usize, usize)> = ITEM_HEADER
        .find_iter(content)
        .map(|m| (m.start(), m.end()))
        .collect();

    headers
        .iter()
        .enumerate()
        .filter_map(|(i, &(_, body_start))| {
            let body_end = headers.get(i + 1).map(|&(start, _)| start).unwrap_or(content.len());
            parse_item(&content[body_start..body_end], citations, category)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const WELL_FORMED: &str = "Here are the items:\n\n\
        1. [POLICY]\n\
        TITLE: Fed signals patience on cuts [1]\n\
        SUMMARY: Officials want more evidence of disinflation. [1][2]\n\n\
        2. [POLICY]\n\
        TITLE: ECB trims rates\n\
        SUMMARY: The euro softened after the decision. [3]\n\n\
        3. [POLICY]\n\
        TITLE: BOJ keeps purchases steady\n\
        SUMMARY: Yen weakness persisted. [2][3][1]\n";

    #[test]
    fn test_well_formed_block() {
        let citations = urls(&["https://a.example", "https://b.example", "https://c.example"]);
        let items = parse_news_response(WELL_FORMED, &citations, NewsCategory::Policy);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Fed signals patience on cuts");
        assert_eq!(items[0].summary, "Officials want more evidence of disinflation.");
        assert_eq!(items[0].urls, urls(&["https://a.example", "https://b.example"]));
        assert_eq!(items[1].urls, urls(&["https://c.example"]));
        // 세 개 인용 중 처음 두 개만
        assert_eq!(items[2].urls, urls(&["https://b.example", "https://c.example"]));
        assert!(items.iter().all(|i| !i.title.is_empty() && i.urls.len() <= 2));
    }

    #[test]
    fn test_chinese_labels_and_separators() {
        let content = "1、[CNY]\n标题：离岸人民币承压 [1]\n摘要：美元走强带动CNH走弱。\n\
                       2）[CNY]\n标题: 港元拆息回落\n摘要: 流动性改善。[2]";
        let citations = urls(&["https://caixin.example/1", "https://yicai.example/2"]);
        let items = parse_news_response(content, &citations, NewsCategory::Cny);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "离岸人民币承压");
        assert_eq!(items[0].summary, "美元走强带动CNH走弱。");
        assert_eq!(items[1].title, "港元拆息回落");
        assert_eq!(items[1].urls, urls(&["https://yicai.example/2"]));
    }

    #[test]
    fn test_labels_case_insensitive_with_markdown() {
        let content = "1. [macro]\n**Title:** Oil spikes on supply fears\n**summary:** Commodity FX rallied.";
        let items = parse_news_response(content, &[], NewsCategory::Macro);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Oil spikes on supply fears");
        assert_eq!(items[0].summary, "Commodity FX rallied.");
    }

    #[test]
    fn test_label_word_inside_title_is_kept() {
        let content = "1. [POLICY]\nTITLE: Fed summary of projections shifts higher [1]\n\
                       SUMMARY: Dots imply fewer cuts; 摘要 in text stays. [1]";
        let items = parse_news_response(content, &urls(&["https://a.example"]), NewsCategory::Policy);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Fed summary of projections shifts higher");
        assert_eq!(items[0].summary, "Dots imply fewer cuts; 摘要 in text stays.");
    }

    #[test]
    fn test_item_without_title_is_dropped() {
        let content = "1. [POLICY]\nSUMMARY: orphan summary\n\n2. [POLICY]\nTITLE: Kept\nSUMMARY: ok";
        let items = parse_news_response(content, &[], NewsCategory::Policy);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Kept");
    }

    #[test]
    fn test_missing_summary_defaults_to_title() {
        let content = "1. [MACRO]\nTITLE: Tariff escalation [1]";
        let items = parse_news_response(content, &urls(&["https://a.example"]), NewsCategory::Macro);
        assert_eq!(items[0].summary, "Tariff escalation");
        assert_eq!(items[0].urls, urls(&["https://a.example"]));
    }

    #[test]
    fn test_out_of_range_and_zero_citations_skipped() {
        let content = "1. [POLICY]\nTITLE: T\nSUMMARY: S [0][5][99999999999999999999999][2]";
        let citations = urls(&["https://a.example", "https://b.example"]);
        let items = parse_news_response(content, &citations, NewsCategory::Policy);
        assert_eq!(items[0].urls, urls(&["https://b.example"]));
    }

    #[test]
    fn test_non_http_citations_skipped_and_deduped() {
        let content = "1. [POLICY]\nTITLE: T [1][1]\nSUMMARY: S [2][3]";
        let citations = urls(&["https://a.example", "", "ftp://c.example"]);
        let items = parse_news_response(content, &citations, NewsCategory::Policy);
        assert_eq!(items[0].urls, urls(&["https://a.example"]));
    }

    #[test]
    fn test_no_items_in_free_text() {
        let content = "I could not find relevant news this week.";
        assert!(parse_news_response(content, &[], NewsCategory::Policy).is_empty());
        assert!(parse_news_response("", &[], NewsCategory::Cny).is_empty());
    }

    #[test]
    fn test_unknown_tag_is_not_a_boundary() {
        let content = "1. [POLICY]\nTITLE: First\nSUMMARY: mentions 2. [OTHER] inline";
        let items = parse_news_response(content, &[], NewsCategory::Policy);
        assert_eq!(items.len(), 1);
        assert!(items[0].summary.contains("[OTHER]"));
    }
}
