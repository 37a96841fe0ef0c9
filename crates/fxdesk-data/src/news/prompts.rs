//! 분류별 검색 프롬프트.
//!
//! 모든 프롬프트는 최근 1주 검색 기간, 가격 나열이 아닌 분석 위주, 저품질 시세
//! 집계 사이트 제외를 요구하고, 파서가 읽는 `N. [TAG] / TITLE / SUMMARY` 형식을 지정합니다.

use chrono::{Duration, NaiveDate};

use super::NewsCategory;
use crate::provider::SearchRequest;

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f64 = 0.1;
const RECENCY: &str = "week";
const ITEMS_PER_CATEGORY: usize = 4;

fn output_format(tag: &str, title_hint: &str, summary_hint: &str) -> String {
    format!(
        "Output exactly {n} items in this format:\n\
         1. [{tag}]\n\
         TITLE: {title_hint}\n\
         SUMMARY: {summary_hint}\n\n\
         2. [{tag}]\n\
         TITLE: ...\n\
         SUMMARY: ...",
        n = ITEMS_PER_CATEGORY,
    )
}

fn policy_system(from: &str, to: &str) -> String {
    format!(
        "You are an FX market analyst covering central banks. Search news published between {from} and {to}.\n\n\
         Cover:\n\
         - Federal Reserve rate expectations and the dollar outlook\n\
         - Policy divergence among the Fed, ECB, BOJ, PBOC and HKMA\n\
         - Analysis of EUR/USD, USD/JPY and GBP/USD\n\n\
         Prefer Reuters, Bloomberg, Financial Times, Wall Street Journal, central bank statements and \
         bank research desks.\n\n\
         Rules:\n\
         - Report analysis and commentary, never bare price quotes\n\
         - Skip fx168, jin10, price-feed pages and currency converters\n\
         - Skip routine daily fixing announcements\n\
         - Every item states why it matters for currencies\n\n{}",
        output_format("POLICY", "Headline of the development", "Two or three sentences on the news and its FX impact"),
    )
}

fn macro_system(from: &str, to: &str) -> String {
    format!(
        "You are a macro strategist. Search news published between {from} and {to}.\n\n\
         Cover events that move currency markets:\n\
         - US-China relations, tariffs and trade measures\n\
         - Regional conflicts, sanctions and capital controls\n\
         - Data releases that surprised consensus\n\
         - Commodity shocks in oil, gold or copper\n\
         - Elections and other political shifts\n\n\
         Rules:\n\
         - Explain the currency impact, not only the event\n\
         - Mention the observed market reaction where available\n\
         - Skip routine data releases without a notable move\n\n{}",
        output_format("MACRO", "Headline of the event", "Two or three sentences on the event and its currency impact"),
    )
}

fn cny_system(from: &str, to: &str) -> String {
    format!(
        "你是外汇市场分析师，请检索 {from} 至 {to} 期间发布的报道。\n\n\
         目标：人民币与港元的深度分析。\n\n\
         优先来源：财新、第一财经、21世纪经济报道、证券时报、券商研究所，以及央行、外管局、金管局的政策解读。\n\n\
         关注：\n\
         - 汇率走势与后市判断\n\
         - 中间价信号、逆周期调节、MLF/LPR 等政策含义\n\
         - 跨境资金流向、结售汇、套息交易\n\
         - 离岸与在岸价差的含义\n\
         - 港元联系汇率与流动性\n\n\
         排除：\n\
         - 单纯报价（例如“今日中间价报7.xxxx”）\n\
         - 汇率换算与牌价查询页面\n\
         - fx168、金十等平台的机械播报\n\n{}",
        output_format("CNY", "清晰的新闻标题", "两到三句话说明内容及市场影响"),
    )
}

/// 분류 하나의 검색 요청 생성. 검색 기간은 `today` 기준 최근 7일입니다.
pub fn build_request(category: NewsCategory, today: NaiveDate) -> SearchRequest {
    let week_ago = today - Duration::days(7);
    let (system, user) = match category {
        NewsCategory::Policy => (
            policy_system(
                &week_ago.format("%B %d, %Y").to_string(),
                &today.format("%B %d, %Y").to_string(),
            ),
            format!(
                "Find {} important central bank policy and FX analysis stories from the past week. Analysis only, no price data.",
                ITEMS_PER_CATEGORY
            ),
        ),
        NewsCategory::Macro => (
            macro_system(
                &week_ago.format("%B %d, %Y").to_string(),
                &today.format("%B %d, %Y").to_string(),
            ),
            format!(
                "Find {} geopolitical or macro events from the past week that moved or could move FX markets, with their currency implications.",
                ITEMS_PER_CATEGORY
            ),
        ),
        NewsCategory::Cny => (
            cny_system(
                &week_ago.format("%Y年%m月%d日").to_string(),
                &today.format("%Y年%m月%d日").to_string(),
            ),
            format!("检索本周{}条人民币与港元的深度分析，只要分析文章，不要报价播报。", ITEMS_PER_CATEGORY),
        ),
    };

    SearchRequest {
        system,
        user,
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        recency: RECENCY.to_string(),
    }
}

/// 기본 3개 분류 요청 (정책 → 거시 → 인민폐 순).
pub fn default_requests(today: NaiveDate) -> Vec<(NewsCategory, SearchRequest)> {
    NewsCategory::ALL
        .iter()
        .map(|category| (*category, build_request(*category, today)))
        .collect()
}
