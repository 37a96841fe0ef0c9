//! 지표 기술자 테이블.
//!
//! 감사 대상 지표마다 본문에서 위치를 찾을 키워드, 정답 값을 담은 DataContext 필드,
//! 허용 오차, 분류를 정의합니다. 런타임에 변경되지 않는 읽기 전용 참조 데이터입니다.
//!
//! 기본 테이블 대신 TOML 파일을 쓸 수 있습니다:
//!
//! ```toml
//! [[indicators]]
//! name = "USD/HKD"
//! keywords = ["USD/HKD", "美元兑港元"]
//! field = "usdhkd"
//! tolerance = 0.02
//! category = "FX"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{AuditError, Result};

/// 지표 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorCategory {
    #[serde(rename = "FX", alias = "fx", alias = "Fx")]
    Fx,
    #[serde(alias = "RATES", alias = "rates")]
    Rates,
    #[serde(alias = "INDEX", alias = "index")]
    Index,
}

/// 감사 지표 한 개.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDescriptor {
    /// 감사 기록에 표시되는 이름
    pub name: String,
    /// 본문 검색 키워드 (선언 순서대로 시도)
    pub keywords: Vec<String>,
    /// 정답 값 필드명
    pub field: String,
    /// 허용 절대 오차
    pub tolerance: f64,
    pub category: IndicatorCategory,
}

impl IndicatorDescriptor {
    pub fn new(
        name: impl Into<String>,
        keywords: &[&str],
        field: impl Into<String>,
        tolerance: f64,
        category: IndicatorCategory,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            field: field.into(),
            tolerance,
            category,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(AuditError::InvalidTolerance {
                name: self.name.clone(),
                tolerance: self.tolerance,
            });
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AuditError::EmptyKeywords(self.name.clone()));
        }
        if self.field.trim().is_empty() {
            return Err(AuditError::EmptyField(self.name.clone()));
        }
        Ok(())
    }
}

/// 기본 지표 테이블. 필드명은 DataContext 섹션 키와 같습니다.
pub fn default_indicators() -> Vec<IndicatorDescriptor> {
    use IndicatorCategory::*;
    vec![
        IndicatorDescriptor::new("USD/CNY 中间价", &["中间价", "USD/CNY", "美元兑人民币"], "usdcny_mid", 0.05, Fx),
        IndicatorDescriptor::new("USD/CNH 离岸", &["离岸人民币", "USD/CNH", "CNH"], "usdcnh_spot", 0.05, Fx),
        IndicatorDescriptor::new("USD/HKD", &["USD/HKD", "美元兑港元", "美元兑港币"], "usdhkd", 0.02, Fx),
        IndicatorDescriptor::new("HIBOR 隔夜", &["隔夜HIBOR", "HIBOR隔夜", "隔夜拆息", "HIBOR"], "hibor_overnight", 0.1, Rates),
        IndicatorDescriptor::new("港美利差", &["港美利差"], "hkd_usd_spread", 0.1, Rates),
        IndicatorDescriptor::new("美元指数", &["美元指数", "DXY"], "dxy", 0.5, Index),
        IndicatorDescriptor::new("EUR/USD", &["EUR/USD", "欧元兑美元"], "eurusd", 0.01, Fx),
        IndicatorDescriptor::new("USD/JPY", &["USD/JPY", "美元兑日元"], "usdjpy", 0.5, Fx),
        IndicatorDescriptor::new("美债10年期收益率", &["10年期美债", "10年期", "US10Y"], "us10y", 0.05, Rates),
        IndicatorDescriptor::new("美债2年期收益率", &["2年期美债", "2年期", "US2Y"], "us2y", 0.05, Rates),
        IndicatorDescriptor::new("VIX", &["VIX", "恐慌指数"], "vix", 0.5, Index),
        IndicatorDescriptor::new("联邦基金利率", &["联邦基金利率", "联邦基金", "Fed Funds"], "fed_rate", 0.05, Rates),
    ]
}

#[derive(Debug, Deserialize)]
struct IndicatorFile {
    #[serde(default)]
    indicators: Vec<IndicatorDescriptor>,
}

/// 검증된 지표 테이블.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    indicators: Vec<IndicatorDescriptor>,
}

impl Default for IndicatorTable {
    fn default() -> Self {
        Self {
            indicators: default_indicators(),
        }
    }
}

impl IndicatorTable {
    /// 기술자 목록 검증 후 생성.
    pub fn new(indicators: Vec<IndicatorDescriptor>) -> Result<Self> {
        if indicators.is_empty() {
            return Err(AuditError::EmptyTable);
        }
        for descriptor in &indicators {
            descriptor.validate()?;
        }
        Ok(Self { indicators })
    }

    /// TOML 파일에서 로드.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let table = Self::from_config(config)?;
        info!(
            path = %path.as_ref().display(),
            indicators = table.len(),
            "감사 지표 테이블 로드"
        );
        Ok(table)
    }

    /// TOML 문자열에서 로드.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: config::Config) -> Result<Self> {
        let file: IndicatorFile = config.try_deserialize()?;
        Self::new(file.indicators)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDescriptor> {
        self.indicators.iter()
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorDescriptor> {
        self.indicators.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
