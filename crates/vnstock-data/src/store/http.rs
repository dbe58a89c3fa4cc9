//! 영속화 API 저장소.
//!
//! 데이터 소스마다 저장 테이블이 다릅니다:
//! - stock-info 일별 통계 → `/stock-statistics` (확장 필드 포함)
//! - charts OHLCV 바 → `/stock-prices` (해상도별)
//!
//! `GET {api}/{table}?symbol=`로 저장된 행을 조회하고 `POST {api}/{table}`로
//! 레코드를 하나씩 업서트합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use vnstock_core::DailyRecord;

use super::RecordStore;
use crate::normalize::{extract_items, parse_trading_date, table::lookup};
use crate::{DataError, Result};

/// 저장 대상 테이블.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreTable {
    /// stock-info 일별 통계
    #[default]
    StockStatistics,
    /// charts OHLCV 바
    StockPrices { resolution: String },
}

impl StoreTable {
    pub fn path(&self) -> &'static str {
        match self {
            Self::StockStatistics => "stock-statistics",
            Self::StockPrices { .. } => "stock-prices",
        }
    }

    /// 저장된 행에서 거래일을 찾을 키
    fn date_keys(&self) -> &'static [&'static str] {
        match self {
            Self::StockStatistics => &["date"],
            Self::StockPrices { .. } => &["timestamp", "date"],
        }
    }

    fn payload(&self, record: &DailyRecord) -> Value {
        match self {
            Self::StockStatistics => record_payload(record),
            Self::StockPrices { resolution } => price_payload(record, resolution),
        }
    }
}

/// 영속화 API 클라이언트.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
    table: StoreTable,
}

impl HttpRecordStore {
    /// `/stock-statistics` 저장소 생성
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: StoreTable::StockStatistics,
        })
    }

    /// 저장 테이블 변경
    pub fn with_table(mut self, table: StoreTable) -> Self {
        self.table = table;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn table(&self) -> &StoreTable {
        &self.table
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.table.path())
    }

    fn lookup_query<'a>(&'a self, symbol: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("symbol", symbol)];
        if let StoreTable::StockPrices { resolution } = &self.table {
            query.push(("resolution", resolution.as_str()));
        }
        query
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn stored_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&self.lookup_query(symbol))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        let rows = extract_items(&payload).unwrap_or(&[]);
        let keys = self.table.date_keys();

        let dates: Vec<NaiveDate> = rows
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|row| lookup(row, keys).and_then(parse_trading_date))
            .collect();

        debug!(
            symbol = symbol,
            table = self.table.path(),
            rows = rows.len(),
            dates = dates.len(),
            "저장된 거래일 조회"
        );
        Ok(dates)
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.table.payload(record))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::Validation(format!(
                "{} {} (HTTP {}): {}",
                record.symbol,
                record.date,
                status.as_u16(),
                body
            )));
        }

        Err(DataError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

/// 일별 통계 레코드를 `/stock-statistics` 요청 본문으로 변환.
///
/// 가격은 `*_price` 필드로, 종가는 `current_price`로도 전달합니다.
/// 확장 필드는 같은 이름으로 펼쳐 넣습니다.
pub fn record_payload(record: &DailyRecord) -> Value {
    let mut body = Map::new();
    body.insert("symbol".to_string(), Value::from(record.symbol.clone()));
    body.insert(
        "date".to_string(),
        Value::from(record.date.format("%Y-%m-%d").to_string()),
    );

    for (name, value) in &record.extra {
        body.insert(name.clone(), value.clone());
    }

    insert_ohlcv(&mut body, record);
    body.insert("current_price".to_string(), decimal_value(record.close));

    Value::Object(body)
}

/// charts 바를 `/stock-prices` 요청 본문으로 변환.
///
/// `timestamp`는 거래일 현지 자정 (`YYYY-MM-DDT00:00:00`).
pub fn price_payload(record: &DailyRecord, resolution: &str) -> Value {
    let mut body = Map::new();
    body.insert("symbol".to_string(), Value::from(record.symbol.clone()));
    body.insert(
        "timestamp".to_string(),
        Value::from(record.date.format("%Y-%m-%dT00:00:00").to_string()),
    );
    body.insert("resolution".to_string(), Value::from(resolution));
    insert_ohlcv(&mut body, record);
    body.insert(
        "value".to_string(),
        record.extra.get("value").cloned().unwrap_or(Value::Null),
    );
    // no_data 응답은 행이 없으므로 저장되는 바는 항상 ok
    body.insert("status".to_string(), Value::from("ok"));

    Value::Object(body)
}

fn insert_ohlcv(body: &mut Map<String, Value>, record: &DailyRecord) {
    body.insert("open_price".to_string(), decimal_value(record.open));
    body.insert("high_price".to_string(), decimal_value(record.high));
    body.insert("low_price".to_string(), decimal_value(record.low));
    body.insert("close_price".to_string(), decimal_value(record.close));
    body.insert(
        "volume".to_string(),
        record.volume.map(Value::from).unwrap_or(Value::Null),
    );
}

fn decimal_value(value: Option<Decimal>) -> Value {
    value
        .and_then(|d| d.to_f64())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record() -> DailyRecord {
        let mut record = DailyRecord::new("ACB", NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        record.open = Some(dec!(25000));
        record.close = Some(dec!(25150.5));
        record.volume = Some(1_200_300);
        record
    }

    #[test]
    fn test_record_payload_field_names() {
        let mut record = record();
        record
            .extra
            .insert("foreign_buy_vol_total".to_string(), json!(15000));

        let payload = record_payload(&record);
        assert_eq!(payload["symbol"], "ACB");
        assert_eq!(payload["date"], "2025-10-01");
        assert_eq!(payload["open_price"], json!(25000.0));
        assert_eq!(payload["close_price"], json!(25150.5));
        assert_eq!(payload["current_price"], json!(25150.5));
        assert_eq!(payload["high_price"], Value::Null);
        assert_eq!(payload["volume"], json!(1_200_300));
        assert_eq!(payload["foreign_buy_vol_total"], json!(15000));
    }

    #[test]
    fn test_price_payload_field_names() {
        let payload = price_payload(&record(), "1d");
        assert_eq!(payload["symbol"], "ACB");
        assert_eq!(payload["timestamp"], "2025-10-01T00:00:00");
        assert_eq!(payload["resolution"], "1d");
        assert_eq!(payload["close_price"], json!(25150.5));
        assert_eq!(payload["volume"], json!(1_200_300));
        assert_eq!(payload["value"], Value::Null);
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("date").is_none());
        assert!(payload.get("current_price").is_none());
    }

    #[test]
    fn test_table_paths() {
        assert_eq!(StoreTable::default().path(), "stock-statistics");
        let prices = StoreTable::StockPrices {
            resolution: "1d".to_string(),
        };
        assert_eq!(prices.path(), "stock-prices");
    }
}
