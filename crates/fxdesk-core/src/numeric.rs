//! 숫자 반올림 및 문자열 절단 유틸리티.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// f64를 Decimal로 변환해 소수점 `dp`자리로 반올림 (0.5는 0에서 먼 쪽으로).
///
/// NaN/무한대처럼 Decimal로 표현할 수 없는 값은 그대로 반환합니다.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// 문자 단위로 최대 `max_chars`자까지 자릅니다 (UTF-8 경계 안전).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
