//! DataContext - 한 리포트 주기의 스냅샷 집계 레코드.
//!
//! 주기 시작 시 비어 있는 상태로 생성되고, 각 fetcher와 파생 지표 계산기가
//! 고정된 순서로 제자리에서 변경합니다. 리포트 생성기와 감사 엔진에는
//! JSON으로 직렬화되어 전달되며, 주기가 끝나면 버려집니다.
//!
//! # 불변식
//!
//! - `news`, `news_detail`, `news_sources`는 항상 같은 길이 (`push_news`로만 추가)
//! - `errors`는 추가 전용 진단 목록이며 파이프라인을 멈추지 않음

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::numeric::truncate_chars;
use crate::section::Section;

/// `errors`에 기록되는 진단 메시지의 최대 길이 (문자 수).
pub const ERROR_MESSAGE_MAX_CHARS: usize = 80;

/// 뉴스 항목당 최대 출처 URL 수.
pub const MAX_NEWS_URLS: usize = 2;

/// 감사 엔진에 넘기는 정답 값 맵 (필드명 → 숫자 또는 null).
pub type GroundTruth = BTreeMap<String, Option<f64>>;

/// DataContext의 지표 섹션 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Cny,
    Hkd,
    GlobalFx,
    Macro,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [Self::Cny, Self::Hkd, Self::GlobalFx, Self::Macro];

    /// 직렬화 시 사용하는 필드명.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cny => "cny",
            Self::Hkd => "hkd",
            Self::GlobalFx => "global_fx",
            Self::Macro => "macro",
        }
    }
}

/// 뉴스 한 건 (표시용 제목, 상세 요약, 출처 URL).
#[derive(Debug, Clone, PartialEq)]
pub struct NewsEntry {
    pub title: String,
    pub detail: String,
    pub urls: Vec<String>,
}

/// 외환/금리/뉴스 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    /// 리포트 날짜 (YYYY-MM-DD, 상하이 시간)
    pub report_date: String,
    /// 스냅샷 시각 (YYYY-MM-DD HH:MM:SS, 상하이 시간)
    pub snapshot: String,
    /// 인민폐: 중간가, 역외 CNH, 스프레드
    #[serde(default)]
    pub cny: Section,
    /// 홍콩달러: USD/HKD, HIBOR, 홍콩-미국 금리차
    #[serde(default)]
    pub hkd: Section,
    /// 글로벌 외환: DXY, 주요 통화쌍
    #[serde(default)]
    pub global_fx: Section,
    /// 매크로: 미국채 금리, VIX, 연준 금리
    #[serde(default, rename = "macro")]
    pub macro_data: Section,
    #[serde(default)]
    news: Vec<String>,
    #[serde(default)]
    news_detail: Vec<String>,
    #[serde(default)]
    news_sources: Vec<Vec<String>>,
    /// 지표 키 → 데이터 제공자 이름
    #[serde(default)]
    pub data_sources: BTreeMap<String, String>,
    #[serde(default)]
    errors: Vec<String>,
}

/// 직렬화 경계용 뷰 (`data_points` 계산 필드 포함).
#[derive(Serialize)]
struct ContextSnapshot<'a> {
    #[serde(flatten)]
    context: &'a DataContext,
    data_points: usize,
}

impl Default for DataContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContext {
    /// 현재 시각 기준 빈 컨텍스트 생성.
    pub fn new() -> Self {
        Self::at(Utc::now().with_timezone(&Shanghai))
    }

    /// 지정 시각 기준 빈 컨텍스트 생성.
    pub fn at(now: DateTime<Tz>) -> Self {
        Self {
            report_date: now.format("%Y-%m-%d").to_string(),
            snapshot: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            cny: Section::new(),
            hkd: Section::new(),
            global_fx: Section::new(),
            macro_data: Section::new(),
            news: Vec::new(),
            news_detail: Vec::new(),
            news_sources: Vec::new(),
            data_sources: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::Cny => &self.cny,
            SectionKind::Hkd => &self.hkd,
            SectionKind::GlobalFx => &self.global_fx,
            SectionKind::Macro => &self.macro_data,
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::Cny => &mut self.cny,
            SectionKind::Hkd => &mut self.hkd,
            SectionKind::GlobalFx => &mut self.global_fx,
            SectionKind::Macro => &mut self.macro_data,
        }
    }

    /// 지표의 데이터 출처 기록.
    pub fn record_source(&mut self, key: impl Into<String>, provider: impl Into<String>) {
        self.data_sources.insert(key.into(), provider.into());
    }

    /// 진단 메시지 추가 (`label: message`, 메시지는 잘림).
    pub fn push_error(&mut self, label: &str, message: impl AsRef<str>) {
        let message = truncate_chars(message.as_ref(), ERROR_MESSAGE_MAX_CHARS);
        tracing::debug!(label = label, message = %message, "진단 기록");
        self.errors.push(format!("{}: {}", label, message));
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// 뉴스 한 건 추가. URL은 최대 2개까지만 보존합니다.
    pub fn push_news(&mut self, entry: NewsEntry) {
        let NewsEntry {
            title,
            detail,
            mut urls,
        } = entry;
        urls.truncate(MAX_NEWS_URLS);
        self.news.push(title);
        self.news_detail.push(detail);
        self.news_sources.push(urls);
    }

    pub fn news(&self) -> &[String] {
        &self.news
    }

    pub fn news_detail(&self) -> &[String] {
        &self.news_detail
    }

    pub fn news_sources(&self) -> &[Vec<String>] {
        &self.news_sources
    }

    /// 뉴스 항목을 (제목, 상세, 출처) 단위로 순회.
    pub fn news_entries(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.news
            .iter()
            .zip(self.news_detail.iter())
            .zip(self.news_sources.iter())
            .map(|((title, detail), urls)| (title.as_str(), detail.as_str(), urls.as_slice()))
    }

    /// null이 아닌 섹션 값 수 + 뉴스 수.
    pub fn count_data_points(&self) -> usize {
        SectionKind::ALL
            .iter()
            .map(|kind| self.section(*kind).present_count())
            .sum::<usize>()
            + self.news.len()
    }

    /// 모든 섹션의 숫자 지표를 평탄화한 정답 맵. 텍스트 값은 제외됩니다.
    pub fn ground_truth(&self) -> GroundTruth {
        let mut truth = GroundTruth::new();
        for kind in SectionKind::ALL {
            for (key, value) in self.section(kind).iter() {
                match value {
                    None => {
                        truth.insert(key.clone(), None);
                    }
                    Some(v) => {
                        if let Some(n) = v.as_number() {
                            truth.insert(key.clone(), Some(n));
                        }
                    }
                }
            }
        }
        truth
    }

    /// `data_points`를 포함한 JSON 값.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        let snapshot = ContextSnapshot {
            context: self,
            data_points: self.count_data_points(),
        };
        Ok(serde_json::to_value(snapshot)?)
    }

    /// 사람이 읽을 수 있는 JSON (들여쓰기, 한자 그대로).
    pub fn to_json(&self) -> Result<String> {
        let snapshot = ContextSnapshot {
            context: self,
            data_points: self.count_data_points(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// JSON에서 복원. 뉴스 배열 길이가 다르면 거부합니다.
    pub fn from_json(json: &str) -> Result<Self> {
        let ctx: DataContext = serde_json::from_str(json)?;
        if ctx.news.len() != ctx.news_detail.len() || ctx.news.len() != ctx.news_sources.len() {
            return Err(CoreError::MisalignedNews {
                news: ctx.news.len(),
                detail: ctx.news_detail.len(),
                sources: ctx.news_sources.len(),
            });
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_context() -> DataContext {
        let now = Shanghai.with_ymd_and_hms(2024, 6, 14, 9, 30, 0).unwrap();
        DataContext::at(now)
    }

    #[test]
    fn test_timestamps_fixed_at_construction() {
        let ctx = fixed_context();
        assert_eq!(ctx.report_date, "2024-06-14");
        assert_eq!(ctx.snapshot, "2024-06-14 09:30:00");
    }

    #[test]
    fn test_push_news_keeps_alignment_and_caps_urls() {
        let mut ctx = fixed_context();
        ctx.push_news(NewsEntry {
            title: "[POLICY] Fed holds".to_string(),
            detail: "The Fed held rates.".to_string(),
            urls: vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                "https://c.example".to_string(),
            ],
        });
        ctx.push_news(NewsEntry {
            title: "[CNY] 中间价".to_string(),
            detail: "中间价".to_string(),
            urls: vec![],
        });

        assert_eq!(ctx.news().len(), 2);
        assert_eq!(ctx.news_detail().len(), 2);
        assert_eq!(ctx.news_sources().len(), 2);
        assert_eq!(ctx.news_sources()[0].len(), 2);
        assert_eq!(ctx.news_entries().count(), 2);
    }

    #[test]
    fn test_push_error_truncates() {
        let mut ctx = fixed_context();
        ctx.push_error("FRED", "x".repeat(200));
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].chars().count(), "FRED: ".len() + 80);
    }

    #[test]
    fn test_count_data_points_skips_nulls() {
        let mut ctx = fixed_context();
        ctx.cny.set_number("usdcny_mid", 7.1234);
        ctx.cny.set_missing("usdcnh_spot");
        ctx.macro_data.set_number("vix", 0.0);
        ctx.push_news(NewsEntry {
            title: "t".into(),
            detail: "d".into(),
            urls: vec![],
        });
        assert_eq!(ctx.count_data_points(), 3);
    }

    #[test]
    fn test_ground_truth_flattens_numbers_only() {
        let mut ctx = fixed_context();
        ctx.cny.set_number("usdcny_mid", 7.1234);
        ctx.cny.set_text("usdcny_mid_date", "2024-06-14");
        ctx.macro_data.set_missing("vix");

        let truth = ctx.ground_truth();
        assert_eq!(truth.get("usdcny_mid"), Some(&Some(7.1234)));
        assert_eq!(truth.get("vix"), Some(&None));
        assert!(!truth.contains_key("usdcny_mid_date"));
    }

    #[test]
    fn test_json_round_trip_preserves_nulls() {
        let mut ctx = fixed_context();
        ctx.hkd.set_number("usdhkd", 7.81);
        ctx.hkd.set_missing("hibor_overnight");
        ctx.global_fx.set_number("dxy", 0.0);
        ctx.record_source("usdhkd", "东方财富");
        ctx.push_error("HIBOR", "timeout");

        let json = ctx.to_json().unwrap();
        assert!(json.contains("\"hibor_overnight\": null"));
        assert!(json.contains("\"macro\""));
        assert!(json.contains("\"data_points\": 2"));

        let back = DataContext::from_json(&json).unwrap();
        assert_eq!(back, ctx);
        assert!(back.hkd.is_missing("hibor_overnight"));
        assert_eq!(back.global_fx.number("dxy"), Some(0.0));
    }

    #[test]
    fn test_from_json_rejects_misaligned_news() {
        let json = r#"{
            "report_date": "2024-06-14",
            "snapshot": "2024-06-14 09:30:00",
            "news": ["a", "b"],
            "news_detail": ["a"],
            "news_sources": [[], []]
        }"#;
        assert!(matches!(
            DataContext::from_json(json),
            Err(CoreError::MisalignedNews { .. })
        ));
    }
}
