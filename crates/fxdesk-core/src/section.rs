//! 지표 섹션.
//!
//! 섹션은 지표 키 → 값 맵입니다. 값은 세 가지 상태를 가집니다:
//!
//! - **키 없음**: 어떤 fetcher도 시도하지 않음
//! - **`None` (JSON `null`)**: 시도했으나 쓸 수 있는 값이 없음
//! - **`Some(value)`**: 숫자 또는 보조 텍스트
//!
//! 0은 정상 값이며 "없음"과 절대 혼동하지 않습니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 섹션에 저장되는 값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    /// 수치 지표 (감사 대상)
    Number(f64),
    /// 보조 텍스트 (날짜, 구간 설명 등)
    Text(String),
}

impl IndicatorValue {
    /// 수치 값이면 반환.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// 텍스트 값이면 반환.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl std::fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 지표 키 → 값(또는 명시적 null) 맵.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(BTreeMap<String, Option<IndicatorValue>>);

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// 숫자 값 저장.
    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), Some(IndicatorValue::Number(value)));
    }

    /// 텍스트 값 저장.
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0
            .insert(key.into(), Some(IndicatorValue::Text(value.into())));
    }

    /// 명시적 null 저장 (시도했으나 값 없음).
    pub fn set_missing(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), None);
    }

    /// `Some`이면 숫자, `None`이면 명시적 null 저장.
    pub fn set_optional(&mut self, key: impl Into<String>, value: Option<f64>) {
        match value {
            Some(v) => self.set_number(key, v),
            None => self.set_missing(key),
        }
    }

    /// 키가 아직 없을 때만 명시적 null 저장. 이미 값이 있으면 건드리지 않습니다.
    pub fn mark_missing_if_absent(&mut self, key: &str) {
        if !self.0.contains_key(key) {
            self.0.insert(key.to_string(), None);
        }
    }

    /// 숫자 값 조회 (키 없음, null, 텍스트는 모두 `None`).
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0
            .get(key)
            .and_then(|v| v.as_ref())
            .and_then(IndicatorValue::as_number)
    }

    /// 텍스트 값 조회.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_ref())
            .and_then(IndicatorValue::as_text)
    }

    /// 원시 엔트리 조회. 바깥 `Option`은 키 존재 여부, 안쪽은 null 여부입니다.
    pub fn get(&self, key: &str) -> Option<&Option<IndicatorValue>> {
        self.0.get(key)
    }

    /// 키 존재 여부 (null 포함).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// 키가 존재하고 값이 null인지.
    pub fn is_missing(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(None))
    }

    /// 키가 존재하고 값이 null이 아닌지.
    pub fn has_value(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// null이 아닌 값 개수.
    pub fn present_count(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<IndicatorValue>)> {
        self.0.iter()
    }
}
