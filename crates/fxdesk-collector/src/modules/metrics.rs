//! 파생 지표 계산 모듈.
//!
//! 모든 fetcher가 끝난 뒤 실행됩니다. 두 피연산자가 모두 값이 있고 결과 키가 아직
//! 값이 없을 때만 계산하므로, 여러 번 호출해도 결과가 같습니다.

use async_trait::async_trait;

use fxdesk_core::{round_dp, DataContext, SectionKind};

use super::CollectStep;

/// 파생 지표 정의.
struct DerivedMetric {
    label: &'static str,
    target: (SectionKind, &'static str),
    minuend: (SectionKind, &'static str),
    subtrahend: (SectionKind, &'static str),
    decimals: u32,
}

const DERIVED: [DerivedMetric; 3] = [
    DerivedMetric {
        label: "港美利差",
        target: (SectionKind::Hkd, "hkd_usd_spread"),
        minuend: (SectionKind::Hkd, "hibor_overnight"),
        subtrahend: (SectionKind::Macro, "fed_rate"),
        decimals: 2,
    },
    DerivedMetric {
        label: "CNY价差",
        target: (SectionKind::Cny, "cny_spread"),
        minuend: (SectionKind::Cny, "usdcnh_spot"),
        subtrahend: (SectionKind::Cny, "usdcny_mid"),
        decimals: 4,
    },
    DerivedMetric {
        label: "收益率曲线",
        target: (SectionKind::Macro, "yield_curve"),
        minuend: (SectionKind::Macro, "us10y"),
        subtrahend: (SectionKind::Macro, "us2y"),
        decimals: 2,
    },
];

/// 파생 지표 계산. 새로 계산한 지표 라벨을 반환합니다.
pub fn calculate_metrics(ctx: &mut DataContext) -> Vec<&'static str> {
    let mut computed = Vec::new();

    for metric in &DERIVED {
        let (target_section, target_key) = metric.target;
        if ctx.section(target_section).has_value(target_key) {
            continue;
        }
        let a = ctx.section(metric.minuend.0).number(metric.minuend.1);
        let b = ctx.section(metric.subtrahend.0).number(metric.subtrahend.1);
        if let (Some(a), Some(b)) = (a, b) {
            let value = round_dp(a - b, metric.decimals);
            ctx.section_mut(target_section).set_number(target_key, value);
            tracing::debug!(metric = metric.label, value = value, "파생 지표 계산");
            computed.push(metric.label);
        }
    }

    computed
}

/// 파이프라인 마지막 단계.
#[derive(Debug, Default)]
pub struct MetricsStep;

#[async_trait]
impl CollectStep for MetricsStep {
    fn name(&self) -> &str {
        "计算衍生指标"
    }

    async fn run(&self, ctx: &mut DataContext) -> String {
        let computed = calculate_metrics(ctx);
        if computed.is_empty() {
            "✅ 计算完成".to_string()
        } else {
            format!("✅ 计算完成: {}", computed.join(", "))
        }
    }
}
