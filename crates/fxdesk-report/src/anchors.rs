//! 역사적 기준점.
//!
//! 모델이 과거 고점/저점을 기억에서 꺼내 쓰지 않도록, 비교에 쓸 수 있는 과거 수치를
//! 명시적으로 제공합니다. 여기 없는 과거 수치는 리포트에 등장하면 안 됩니다.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnchor {
    pub label: String,
    pub value: String,
}

impl HistoryAnchor {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// 기본 기준점 목록.
pub fn default_history_anchors() -> Vec<HistoryAnchor> {
    vec![
        HistoryAnchor::new("港元联系汇率区间", "7.75（强方兑换保证）- 7.85（弱方兑换保证）"),
        HistoryAnchor::new("人民币中间价形成机制改革", "2015年8月11日"),
        HistoryAnchor::new("在岸人民币首次破7", "2019年8月5日"),
        HistoryAnchor::new("美元指数2022年高点", "约114.8（2022年9月）"),
        HistoryAnchor::new("联邦基金目标利率本轮上限", "5.25%-5.50%（2023年7月至2024年9月）"),
    ]
}

/// 프롬프트 삽입용 목록 (`- 라벨: 값`).
pub fn render_anchors(anchors: &[HistoryAnchor]) -> String {
    anchors
        .iter()
        .map(|a| format!("- {}: {}", a.label, a.value))
        .collect::<Vec<_>>()
        .join("\n")
}
