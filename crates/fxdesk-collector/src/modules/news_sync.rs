//! 뉴스 동기화 모듈.
//!
//! 분류(정책/거시/인민폐)별로 검색 증강 completion을 호출하고 응답을 파싱합니다.
//! 한 분류의 실패는 다른 분류를 막지 않습니다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use fxdesk_core::DataContext;
use fxdesk_data::news::{default_requests, parse_news_response};
use fxdesk_data::{DataError, NewsCategory, NewsItem, SearchCompletion};

use super::cny_sync::report_day;
use super::{CollectStep, FetchPolicy};

const NEWS_SOURCE: &str = "Perplexity(Policy+Macro+CNY)";

pub struct NewsSync {
    search: Arc<dyn SearchCompletion>,
    policy: FetchPolicy,
    ttl: Duration,
}

impl NewsSync {
    pub fn new(search: Arc<dyn SearchCompletion>, policy: FetchPolicy, ttl: Duration) -> Self {
        Self {
            search,
            policy,
            ttl,
        }
    }
}

#[async_trait]
impl CollectStep for NewsSync {
    fn name(&self) -> &str {
        "Perplexity 新闻"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        let mut counts: HashMap<NewsCategory, usize> = HashMap::new();

        for (category, request) in default_requests(report_day(ctx)) {
            let cache_key = format!("news:{}", category.tag());
            let search = &self.search;
            let request = &request;
            let result: Result<Vec<NewsItem>, DataError> = self
                .policy
                .cached(&cache_key, self.ttl, || async move {
                    let response = search.search(request).await?;
                    let items =
                        parse_news_response(&response.content, &response.citations, category);
                    // 빈 응답은 캐시하지 않고 재시도
                    if items.is_empty() {
                        return Err(DataError::NoData("no news items parsed".to_string()));
                    }
                    Ok(items)
                })
                .await;

            match result {
                Ok(items) => {
                    info!(category = category.tag(), items = items.len(), "뉴스 파싱 완료");
                    counts.insert(category, items.len());
                    for item in items {
                        ctx.push_news(item.into_entry());
                    }
                }
                Err(DataError::MissingCredential(_)) => {
                    ctx.push_error("Perplexity", "PERPLEXITY_API_KEY 未配置");
                    warn!("검색 API 키 없음, 뉴스 건너뜀");
                    return "⚠️ Perplexity 未配置".to_string();
                }
                Err(e) => {
                    counts.insert(category, 0);
                    ctx.push_error(&format!("Perplexity {}", category.tag()), e.to_string());
                    warn!(category = category.tag(), error = %e, "뉴스 검색 실패");
                }
            }
        }

        let total: usize = counts.values().sum();
        if total > 0 {
            ctx.record_source("news", NEWS_SOURCE);
        }
        let count = |c: NewsCategory| counts.get(&c).copied().unwrap_or(0);
        format!(
            "{} 新闻: {}条 ({}:{} {}:{} {}:{})",
            if total > 0 { "✅" } else { "⚠️" },
            total,
            NewsCategory::Policy.label(),
            count(NewsCategory::Policy),
            NewsCategory::Macro.label(),
            count(NewsCategory::Macro),
            NewsCategory::Cny.label(),
            count(NewsCategory::Cny),
        )
    }
}
