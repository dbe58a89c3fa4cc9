//! 필드 정규화 테이블.

use serde_json::{Map, Value};
use vnstock_core::DailyRecord;

use super::{parse_decimal, parse_integer, parse_trading_date};

/// 확장 필드 값 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Decimal,
    Integer,
}

/// 정규화 필드 하나: 정규 이름 + 우선순위 순 후보 키.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
    pub kind: FieldKind,
}

const fn spec(
    name: &'static str,
    candidates: &'static [&'static str],
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        candidates,
        kind,
    }
}

const DATE_KEYS: &[&str] = &["date", "tradingDate", "trading_date"];
const OPEN_KEYS: &[&str] = &["open_price", "openPrice", "open", "open_raw", "openRaw"];
const HIGH_KEYS: &[&str] = &["high_price", "highPrice", "high", "high_raw", "highRaw"];
const LOW_KEYS: &[&str] = &["low_price", "lowPrice", "low", "low_raw", "lowRaw"];
const CLOSE_KEYS: &[&str] = &["close_price", "closePrice", "close", "close_raw", "closeRaw"];
const VOLUME_KEYS: &[&str] = &["volume", "totalMatchVol", "total_match_vol"];

use self::FieldKind::{Decimal as Dec, Integer as Int};

/// stock-info 엔드포인트의 확장 필드 (가격 변동, 외국인 매매, 체결 통계, raw 가격)
const STOCK_INFO_EXTENDED: &[FieldSpec] = &[
    spec("change_amount", &["priceChanged", "price_changed", "change_amount"], Dec),
    spec("change_percent", &["perPriceChange", "per_price_change", "change_percent"], Dec),
    spec("value", &["totalMatchVal", "total_match_val", "value"], Int),
    spec("ceiling_price", &["ceilingPrice", "ceiling_price"], Dec),
    spec("floor_price", &["floorPrice", "floor_price"], Dec),
    spec("ref_price", &["refPrice", "ref_price"], Dec),
    spec("avg_price", &["avgPrice", "avg_price"], Dec),
    spec("close_price_adjusted", &["closePriceAdjusted", "close_price_adjusted"], Dec),
    spec("total_match_vol", &["totalMatchVol", "total_match_vol"], Int),
    spec("total_deal_val", &["totalDealVal", "total_deal_val"], Int),
    spec("total_deal_vol", &["totalDealVol", "total_deal_vol"], Int),
    spec("foreign_buy_vol_total", &["foreignBuyVolTotal", "foreign_buy_vol_total"], Int),
    spec("foreign_current_room", &["foreignCurrentRoom", "foreign_current_room"], Int),
    spec("foreign_sell_vol_total", &["foreignSellVolTotal", "foreign_sell_vol_total"], Int),
    spec("foreign_buy_val_total", &["foreignBuyValTotal", "foreign_buy_val_total"], Int),
    spec("foreign_sell_val_total", &["foreignSellValTotal", "foreign_sell_val_total"], Int),
    spec("foreign_buy_vol_matched", &["foreignBuyVolMatched", "foreign_buy_vol_matched"], Int),
    spec("foreign_buy_vol_deal", &["foreignBuyVolDeal", "foreign_buy_vol_deal"], Int),
    spec("total_buy_trade", &["totalBuyTrade", "total_buy_trade"], Int),
    spec("total_buy_trade_vol", &["totalBuyTradeVol", "total_buy_trade_vol"], Int),
    spec("total_sell_trade", &["totalSellTrade", "total_sell_trade"], Int),
    spec("total_sell_trade_vol", &["totalSellTradeVol", "total_sell_trade_vol"], Int),
    spec("net_buy_sell_vol", &["netBuySellVol", "net_buy_sell_vol"], Int),
    spec("net_buy_sell_val", &["netBuySellVal", "net_buy_sell_val"], Int),
    spec("open_raw", &["openRaw", "open_raw"], Dec),
    spec("high_raw", &["highRaw", "high_raw"], Dec),
    spec("low_raw", &["lowRaw", "low_raw"], Dec),
    spec("close_raw", &["closeRaw", "close_raw"], Dec),
];

/// 정규 레코드 필드별 후보 키 테이블.
///
/// 엔드포인트마다 테이블만 바꿔 같은 수집기를 재사용합니다.
#[derive(Debug, Clone)]
pub struct FieldTable {
    pub name: &'static str,
    pub date: &'static [&'static str],
    pub open: &'static [&'static str],
    pub high: &'static [&'static str],
    pub low: &'static [&'static str],
    pub close: &'static [&'static str],
    pub volume: &'static [&'static str],
    pub extended: &'static [FieldSpec],
}

impl FieldTable {
    /// OHLCV만 추출하는 테이블 (charts history 등)
    pub fn ohlcv() -> Self {
        Self {
            name: "ohlcv",
            date: DATE_KEYS,
            open: OPEN_KEYS,
            high: HIGH_KEYS,
            low: LOW_KEYS,
            close: CLOSE_KEYS,
            volume: VOLUME_KEYS,
            extended: &[],
        }
    }

    /// stock-info 전체 필드 테이블
    pub fn stock_info() -> Self {
        Self {
            name: "stock-info",
            extended: STOCK_INFO_EXTENDED,
            ..Self::ohlcv()
        }
    }

    /// 응답 항목 하나를 정규 레코드로 변환.
    ///
    /// 객체가 아니거나 거래일을 해석할 수 없으면 `None`.
    pub fn normalize(&self, symbol: &str, item: &Value) -> Option<DailyRecord> {
        let obj = item.as_object()?;
        let date = lookup(obj, self.date).and_then(parse_trading_date)?;

        let mut record = DailyRecord::new(symbol, date);
        record.open = lookup(obj, self.open).and_then(parse_decimal);
        record.high = lookup(obj, self.high).and_then(parse_decimal);
        record.low = lookup(obj, self.low).and_then(parse_decimal);
        record.close = lookup(obj, self.close).and_then(parse_decimal);
        record.volume = lookup(obj, self.volume).and_then(parse_integer);

        for field in self.extended {
            let Some(raw) = lookup(obj, field.candidates) else {
                continue;
            };
            if let Some(value) = coerce(raw, field.kind) {
                record.extra.insert(field.name.to_string(), value);
            }
        }

        Some(record)
    }
}

/// 후보 키를 순서대로 조회해 null이 아닌 첫 값을 반환
pub fn lookup<'a>(obj: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn coerce(raw: &Value, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Decimal => parse_decimal(raw)
            .and_then(|d| rust_decimal::prelude::ToPrimitive::to_f64(&d))
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldKind::Integer => parse_integer(raw).map(Value::from),
    }
}
