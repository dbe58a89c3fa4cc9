//! 응답 본문에서 결과 배열과 전체 건수 추출.
//!
//! 엔드포인트마다 중첩 구조가 달라 여러 형태를 순서대로 시도합니다.

use serde_json::Value;

use super::parse_integer;

const TOP_LEVEL_KEYS: &[&str] = &["data", "items", "rows", "list", "records", "payload"];
const NESTED_KEYS: &[&str] = &["items", "rows", "list", "records"];

/// 결과 배열 추출.
///
/// 인식할 수 없는 구조면 `None`을 반환합니다. `{"data": null}`은 빈 결과로 봅니다.
pub fn extract_items(payload: &Value) -> Option<&[Value]> {
    if let Some(items) = payload.as_array() {
        return Some(items.as_slice());
    }

    let obj = payload.as_object()?;
    for key in TOP_LEVEL_KEYS {
        if let Some(items) = obj.get(*key).and_then(Value::as_array) {
            return Some(items.as_slice());
        }
    }

    match obj.get("data") {
        Some(Value::Object(data)) => NESTED_KEYS
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice),
        Some(Value::Null) => Some(&[][..]),
        _ => None,
    }
}

/// 전체 건수 추출 (`paging.total`, `total`, `data.total`, `totalRecord`).
pub fn extract_total(payload: &Value) -> Option<u64> {
    let candidates = [
        payload.pointer("/paging/total"),
        payload.get("total"),
        payload.pointer("/data/total"),
        payload.get("totalRecord"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(parse_integer)
        .and_then(|n| u64::try_from(n).ok())
}
