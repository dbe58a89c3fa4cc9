//! Charts history 응답 변환.
//!
//! charts history 엔드포인트는 `{t, o, h, l, c, v}` 컬럼 배열을 반환합니다.
//! 행 단위 객체 배열로 바꿔 stock-info와 같은 정규화 경로를 타게 합니다.

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde_json::{json, Map, Value};

use crate::{DataError, Result};

/// 밀리초 단위로 판단하는 기준 (이보다 크면 ms)
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// 날짜 범위를 `[start 00:00:00, end 23:59:59]` Unix 초로 변환
pub fn window_timestamps(start: NaiveDate, end: NaiveDate, tz: Tz) -> (i64, i64) {
    let from = start.and_time(NaiveTime::MIN);
    let to = end.and_hms_opt(23, 59, 59).unwrap_or(from);

    let to_unix = |naive: chrono::NaiveDateTime| {
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp())
            .unwrap_or_else(|| naive.and_utc().timestamp())
    };

    (to_unix(from), to_unix(to))
}

/// 컬럼형 응답을 행 객체 배열로 변환.
///
/// `s == "no_data"`이면 빈 배열을 반환합니다.
pub fn chart_rows(payload: &Value, tz: Tz) -> Result<Vec<Value>> {
    let columns = locate_columns(payload).ok_or_else(|| {
        DataError::Shape("charts history 응답에 컬럼 배열(t)이 없습니다".to_string())
    })?;

    if columns.get("s").and_then(Value::as_str) == Some("no_data") {
        return Ok(Vec::new());
    }

    let timestamps = column(columns, "t");
    let opens = column(columns, "o");
    let highs = column(columns, "h");
    let lows = column(columns, "l");
    let closes = column(columns, "c");
    let volumes = column(columns, "v");

    let at = |col: &[Value], i: usize| col.get(i).cloned().unwrap_or(Value::Null);

    let rows = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = timestamp_to_date(ts, tz)?;
            Some(json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "open": at(opens, i),
                "high": at(highs, i),
                "low": at(lows, i),
                "close": at(closes, i),
                "volume": at(volumes, i),
            }))
        })
        .collect();

    Ok(rows)
}

fn locate_columns(payload: &Value) -> Option<&Map<String, Value>> {
    if let Some(data) = payload.get("data").and_then(Value::as_object) {
        if data.contains_key("t") || data.contains_key("s") {
            return Some(data);
        }
    }
    payload
        .as_object()
        .filter(|obj| obj.contains_key("t") || obj.contains_key("s"))
}

fn column<'a>(columns: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    columns
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn timestamp_to_date(ts: &Value, tz: Tz) -> Option<NaiveDate> {
    let mut secs = ts.as_i64().or_else(|| ts.as_f64().map(|f| f as i64))?;
    if secs > MILLIS_THRESHOLD {
        secs /= 1000;
    }
    tz.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.date_naive())
}
