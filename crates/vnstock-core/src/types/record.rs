//! 일별 시세 레코드.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 하루 단위 거래 관측값 (OHLCV + 확장 필드).
///
/// `(symbol, date)`가 고유 키입니다. 호가/외국인 매매/세션 정보 등 확장 필드는
/// 정규화된 필드명 → 값 맵(`extra`)으로 그대로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// 종목 코드 (예: "ACB")
    pub symbol: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub open: Option<Decimal>,
    /// 고가
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub high: Option<Decimal>,
    /// 저가
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub low: Option<Decimal>,
    /// 종가
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub close: Option<Decimal>,
    /// 거래량
    #[serde(default)]
    pub volume: Option<i64>,
    /// 확장 필드
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DailyRecord {
    /// 가격 정보 없이 키만 가진 레코드 생성
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            extra: BTreeMap::new(),
        }
    }

    /// OHLC 중 하나라도 값이 있는지
    pub fn has_prices(&self) -> bool {
        self.open.is_some() || self.high.is_some() || self.low.is_some() || self.close.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prices_serialize_as_floats() {
        let mut record = DailyRecord::new("ACB", NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        record.close = Some(dec!(25.15));
        record.volume = Some(1_200_300);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["close"], serde_json::json!(25.15));
        assert_eq!(json["open"], serde_json::Value::Null);
        assert_eq!(json["date"], "2025-10-01");
        assert!(json.get("extra").is_none());
        assert!(record.has_prices());
    }
}
