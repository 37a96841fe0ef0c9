//! 키워드 앵커 기반 수치 추출.
//!
//! 키워드의 첫 출현(대소문자 무시) 직후 고정 길이 창에서 숫자 토큰을 찾고,
//! 정답 값과 가장 가까운 토큰을 고릅니다. 소수점 토큰이 있으면 정수 토큰(연도, 번호 등)은
//! 무시하며, 정답과 지나치게 먼 토큰은 우연의 일치로 보고 버립니다.

use once_cell::sync::Lazy;
use regex::Regex;

/// 키워드 뒤 검색 창 크기 (문자 수).
pub const DEFAULT_WINDOW_CHARS: usize = 50;

/// 허용 상한: 정답 절대값의 비율.
const CEILING_RELATIVE: f64 = 0.5;

/// 허용 상한: 허용 오차의 배수.
const CEILING_TOLERANCE_MULTIPLE: f64 = 20.0;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));

/// 대소문자 무시 첫 출현 위치 (바이트 범위).
pub(crate) fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in haystack.char_indices() {
        let mut hay = haystack[start..].char_indices();
        let mut matched = true;
        let mut end = start;
        for n in needle.chars() {
            match hay.next() {
                Some((offset, h)) if chars_eq_ignore_case(h, n) => {
                    end = start + offset + h.len_utf8();
                }
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some((start, end));
        }
    }
    None
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// `text`의 처음 `max_chars` 문자.
fn leading_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct NumberToken {
    value: f64,
    has_decimal: bool,
}

/// 창 안의 숫자 토큰. `-`는 앞 글자가 숫자/문자가 아닐 때만 부호로 봅니다 (`7.81-7.83` 같은 구간 표기).
fn number_tokens(window: &str) -> Vec<NumberToken> {
    NUMBER
        .find_iter(window)
        .filter_map(|m| {
            let mut token = m.as_str();
            if token.starts_with('-') {
                let prev = window[..m.start()].chars().next_back();
                if prev.is_some_and(|c| c.is_alphanumeric() || c == '.') {
                    token = &token[1..];
                }
            }
            let value = token.parse::<f64>().ok()?;
            Some(NumberToken {
                value,
                has_decimal: token.contains('.'),
            })
        })
        .collect()
}

/// 창에서 정답에 가장 가까운 후보.
fn closest_in_window(window: &str, truth: f64, tolerance: f64) -> Option<f64> {
    let tokens = number_tokens(window);
    let prefer_decimal = tokens.iter().any(|t| t.has_decimal);
    let ceiling = (truth.abs() * CEILING_RELATIVE).max(tolerance * CEILING_TOLERANCE_MULTIPLE);

    tokens
        .iter()
        .filter(|t| !prefer_decimal || t.has_decimal)
        .map(|t| (t.value, (t.value - truth).abs()))
        .filter(|(_, diff)| *diff < ceiling)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(value, _)| value)
}

/// 키워드를 선언 순서대로 시도해 첫 후보 수치를 돌려줍니다.
///
/// 키워드가 본문에 있어도 창에 쓸 만한 숫자가 없으면 다음 키워드로 넘어갑니다.
pub fn extract_candidate(
    text: &str,
    keywords: &[String],
    truth: f64,
    tolerance: f64,
    window_chars: usize,
) -> Option<f64> {
    keywords.iter().find_map(|keyword| {
        let (_, end) = find_case_insensitive(text, keyword.trim())?;
        let window = leading_chars(&text[end..], window_chars);
        closest_in_window(window, truth, tolerance)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_case_insensitive() {
        assert_eq!(find_case_insensitive("The vix rose", "VIX"), Some((4, 7)));
        assert_eq!(find_case_insensitive("本周中间价报7.12", "中间价"), Some((6, 15)));
        assert_eq!(find_case_insensitive("abc", "abcd"), None);
        assert_eq!(find_case_insensitive("abc", ""), None);
    }

    #[test]
    fn test_extracts_decimal_after_keyword() {
        let text = "本周人民币中间价报7.12附近，较上周小幅走弱。";
        assert_eq!(extract_candidate(text, &kw(&["中间价"]), 7.1234, 0.05, 50), Some(7.12));
    }

    #[test]
    fn test_prefers_decimal_over_year() {
        let text = "美元指数 2024年6月收于104.25";
        assert_eq!(extract_candidate(text, &kw(&["美元指数"]), 104.3, 0.5, 50), Some(104.25));
    }

    #[test]
    fn test_closest_token_wins() {
        let text = "USD/HKD 在 7.79 至 7.81 之间";
        assert_eq!(extract_candidate(text, &kw(&["USD/HKD"]), 7.805, 0.02, 50), Some(7.81));
    }

    #[test]
    fn test_range_dash_is_not_a_sign() {
        let text = "USD/HKD 区间 7.81-7.83";
        assert_eq!(extract_candidate(text, &kw(&["USD/HKD"]), 7.83, 0.02, 50), Some(7.83));
    }

    #[test]
    fn test_negative_value() {
        let text = "港美利差 为 -0.85 个百分点";
        assert_eq!(extract_candidate(text, &kw(&["港美利差"]), -0.85, 0.1, 50), Some(-0.85));
    }

    #[test]
    fn test_far_values_rejected_as_noise() {
        let text = "VIX 指数 第3周";
        // 3 vs 13.2: 차이 10.2 ≥ 상한 max(6.6, 10.0)
        assert_eq!(extract_candidate(text, &kw(&["VIX"]), 13.2, 0.5, 50), None);
        let text = "中间价 公告编号 42.5";
        assert_eq!(extract_candidate(text, &kw(&["中间价"]), 7.1234, 0.05, 50), None);
    }

    #[test]
    fn test_window_bounds_search() {
        let filler = "很".repeat(60);
        let text = format!("中间价{}7.12", filler);
        assert_eq!(extract_candidate(&text, &kw(&["中间价"]), 7.1234, 0.05, 50), None);
    }

    #[test]
    fn test_falls_through_to_next_keyword() {
        let text = "中间价维持稳定。USD/CNY 7.1200";
        assert_eq!(
            extract_candidate(text, &kw(&["中间价", "USD/CNY"]), 7.1234, 0.05, 5),
            Some(7.12)
        );
    }

    #[test]
    fn test_non_numeric_window() {
        let text = "VIX 数据暂缺";
        assert_eq!(extract_candidate(text, &kw(&["VIX"]), 13.2, 0.5, 50), None);
    }

    #[test]
    fn test_keyword_not_found() {
        assert_eq!(extract_candidate("nothing here", &kw(&["DXY"]), 104.0, 0.5, 50), None);
    }
}
