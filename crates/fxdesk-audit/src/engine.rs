//! 수치 감사 엔진.
//!
//! 지표마다:
//! 1. 정답 값이 null(또는 필드 없음)이면 `WARNING`("数据缺失"), 본문은 보지 않음
//! 2. 키워드 앵커 창에서 후보 수치를 찾지 못하면 `WARNING`("报告中未提及")
//! 3. 후보와 정답의 차이가 허용 오차 이내면 `PASS`, 아니면 `FAIL`
//!
//! `is_valid`는 `FAIL`이 하나라도 있을 때만 false입니다. 누락은 위조가 아닙니다.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::extract::{extract_candidate, DEFAULT_WINDOW_CHARS};
use crate::indicator::{IndicatorDescriptor, IndicatorTable};
use fxdesk_core::{round_dp, DataContext, GroundTruth};

pub const MSG_DATA_MISSING: &str = "数据缺失";
pub const MSG_NOT_MENTIONED: &str = "报告中未提及";

/// 차이값 반올림 자릿수 (부동소수 오차로 경계값이 FAIL 되는 것 방지).
const DIFF_DECIMALS: u32 = 4;

/// 감사 결과 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Pass,
    Fail,
    Warning,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warning => "WARNING",
        };
        write!(f, "{}", s)
    }
}

/// 지표 하나의 감사 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// 지표 이름
    pub item: String,
    /// 본문에서 추출한 값
    pub report_val: Option<f64>,
    /// 정답 값
    pub raw_val: Option<f64>,
    /// 절대 차이
    pub diff: Option<f64>,
    pub status: AuditStatus,
    pub msg: String,
}

/// 상태별 건수.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub pass: usize,
    pub fail: usize,
    pub warning: usize,
}

/// 감사 리포트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub is_valid: bool,
    pub records: Vec<AuditRecord>,
}

impl AuditReport {
    fn from_records(records: Vec<AuditRecord>) -> Self {
        let is_valid = !records.iter().any(|r| r.status == AuditStatus::Fail);
        Self { is_valid, records }
    }

    pub fn summary(&self) -> AuditSummary {
        self.records
            .iter()
            .fold(AuditSummary::default(), |mut acc, r| {
                match r.status {
                    AuditStatus::Pass => acc.pass += 1,
                    AuditStatus::Fail => acc.fail += 1,
                    AuditStatus::Warning => acc.warning += 1,
                }
                acc
            })
    }

    pub fn failures(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(|r| r.status == AuditStatus::Fail)
    }

    pub fn record(&self, item: &str) -> Option<&AuditRecord> {
        self.records.iter().find(|r| r.item == item)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// 수치 감사 엔진.
#[derive(Debug, Clone)]
pub struct AuditEngine {
    table: IndicatorTable,
    window_chars: usize,
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(IndicatorTable::default())
    }
}

impl AuditEngine {
    pub fn new(table: IndicatorTable) -> Self {
        Self {
            table,
            window_chars: DEFAULT_WINDOW_CHARS,
        }
    }

    /// 키워드 뒤 검색 창 크기 변경.
    pub fn with_window(mut self, window_chars: usize) -> Self {
        self.window_chars = window_chars;
        self
    }

    pub fn table(&self) -> &IndicatorTable {
        &self.table
    }

    fn audit_indicator(&self, descriptor: &IndicatorDescriptor, truth: Option<f64>, text: &str) -> AuditRecord {
        let Some(raw) = truth else {
            return AuditRecord {
                item: descriptor.name.clone(),
                report_val: None,
                raw_val: None,
                diff: None,
                status: AuditStatus::Warning,
                msg: MSG_DATA_MISSING.to_string(),
            };
        };

        let candidate = extract_candidate(
            text,
            &descriptor.keywords,
            raw,
            descriptor.tolerance,
            self.window_chars,
        );
        let Some(reported) = candidate else {
            return AuditRecord {
                item: descriptor.name.clone(),
                report_val: None,
                raw_val: Some(raw),
                diff: None,
                status: AuditStatus::Warning,
                msg: MSG_NOT_MENTIONED.to_string(),
            };
        };

        let diff = round_dp((reported - raw).abs(), DIFF_DECIMALS);
        let (status, msg) = if diff <= descriptor.tolerance {
            (AuditStatus::Pass, format!("一致 (误差 {} ≤ 容差 {})", diff, descriptor.tolerance))
        } else {
            (
                AuditStatus::Fail,
                format!("报告值 {} 与数据 {} 偏差 {} 超出容差 {}", reported, raw, diff, descriptor.tolerance),
            )
        };

        AuditRecord {
            item: descriptor.name.clone(),
            report_val: Some(reported),
            raw_val: Some(raw),
            diff: Some(diff),
            status,
            msg,
        }
    }

    /// 정답 맵과 본문 대조. 맵에 없는 필드는 null과 같이 취급합니다.
    pub fn audit(&self, ground_truth: &GroundTruth, text: &str) -> AuditReport {
        let records: Vec<AuditRecord> = self
            .table
            .iter()
            .map(|descriptor| {
                let truth = ground_truth.get(&descriptor.field).copied().flatten();
                let record = self.audit_indicator(descriptor, truth, text);
                if record.status == AuditStatus::Fail {
                    warn!(
                        item = %record.item,
                        report_val = ?record.report_val,
                        raw_val = ?record.raw_val,
                        diff = ?record.diff,
                        "감사 불일치"
                    );
                } else {
                    debug!(item = %record.item, status = %record.status, "감사 기록");
                }
                record
            })
            .collect();

        let report = AuditReport::from_records(records);
        let summary = report.summary();
        info!(
            is_valid = report.is_valid,
            pass = summary.pass,
            fail = summary.fail,
            warning = summary.warning,
            "수치 감사 완료"
        );
        report
    }

    /// DataContext에서 정답 맵을 만들어 감사.
    pub fn audit_context(&self, ctx: &DataContext, text: &str) -> AuditReport {
        self.audit(&ctx.ground_truth(), text)
    }
}
