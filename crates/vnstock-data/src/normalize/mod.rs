//! SSI 응답 정규화.
//!
//! SSI API는 snake_case/camelCase를 섞어 쓰고, 같은 가격을 raw/adjusted 두 가지로
//! 내려주기도 합니다. 필드별 후보 키 목록([`FieldTable`])을 순서대로 조회해
//! [`DailyRecord`](vnstock_core::DailyRecord)로 변환합니다.
//!
//! 값 변환 규칙:
//! - `""`, `null`, `"-"`는 0이 아니라 결측값
//! - 천 단위 구분 쉼표 제거 (`"1,234.5"` → `1234.5`)
//! - 날짜는 `DD/MM/YYYY` 또는 `YYYY-MM-DD...`

pub mod extract;
pub mod table;

pub use extract::{extract_items, extract_total};
pub use table::{FieldKind, FieldSpec, FieldTable};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// JSON 값을 Decimal로 변환. 결측/변환 불가 시 `None`.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => decimal_from_str(&n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            if is_missing_marker(s) {
                return None;
            }
            decimal_from_str(&s.replace(',', ""))
        }
        _ => None,
    }
}

/// JSON 값을 정수로 변환 (소수점 이하 버림). 결측/변환 불가 시 `None`.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| f.trunc().to_i64()),
        },
        Value::String(_) => parse_decimal(value).and_then(|d| d.trunc().to_i64()),
        _ => None,
    }
}

/// 거래일 파싱 (`D/M/YYYY` 또는 `YYYY-MM-DD`로 시작하는 문자열).
///
/// 일/월 앞의 0은 생략될 수 있습니다 (`1/10/2025`).
pub fn parse_trading_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();

    if s.contains('/') {
        // 시각이 붙은 경우 날짜 부분만 사용
        let head = s.split_whitespace().next()?;
        return NaiveDate::parse_from_str(head, "%d/%m/%Y").ok();
    }

    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || s == "-"
}

fn decimal_from_str(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
