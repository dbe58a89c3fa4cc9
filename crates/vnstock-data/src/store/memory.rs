//! 메모리 저장소.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use vnstock_core::DailyRecord;

use super::RecordStore;
use crate::{DataError, Result};

/// `(symbol, date)` 키의 메모리 저장소.
///
/// 드라이런에서는 실제 API 대신 이 저장소에 업서트합니다.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<(String, NaiveDate), DailyRecord>>,
    rejected_dates: HashSet<NaiveDate>,
    upsert_calls: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 레코드로 초기화
    pub fn with_records(records: impl IntoIterator<Item = DailyRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| ((r.symbol.clone(), r.date), r))
            .collect();
        Self {
            records: Mutex::new(map),
            ..Self::default()
        }
    }

    /// 해당 거래일 레코드를 검증 오류로 거부하도록 설정
    pub fn rejecting(mut self, date: NaiveDate) -> Self {
        self.rejected_dates.insert(date);
        self
    }

    /// 심볼의 저장 레코드 (날짜 오름차순)
    pub fn records_for(&self, symbol: &str) -> Vec<DailyRecord> {
        self.records
            .lock()
            .map(|map| {
                map.values()
                    .filter(|r| r.symbol == symbol)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 저장된 전체 레코드 수
    pub fn len(&self) -> usize {
        self.records.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `upsert` 호출 횟수
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn stored_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let map = self
            .records
            .lock()
            .map_err(|_| DataError::Transport("memory store lock poisoned".to_string()))?;
        Ok(map
            .keys()
            .filter(|(s, _)| s == symbol)
            .map(|(_, date)| *date)
            .collect())
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejected_dates.contains(&record.date) {
            return Err(DataError::Validation(format!(
                "{} {} 레코드 거부",
                record.symbol, record.date
            )));
        }

        let mut map = self
            .records
            .lock()
            .map_err(|_| DataError::Transport("memory store lock poisoned".to_string()))?;
        map.insert((record.symbol.clone(), record.date), record.clone());
        Ok(())
    }
}
