//! 레코드 저장소.
//!
//! - [`RecordStore`]: 저장된 거래일 조회 + 단건 업서트
//! - [`HttpRecordStore`]: 영속화 API 클라이언트 (`/stock-statistics`, `/stock-prices`)
//! - [`MemoryRecordStore`]: 메모리 저장소 (테스트/드라이런)
//! - [`deliver`]: 재시도 정책에 따른 일괄 전달

pub mod http;
pub mod memory;
pub mod retry;

pub use http::{price_payload, record_payload, HttpRecordStore, StoreTable};
pub use memory::MemoryRecordStore;
pub use retry::{deliver, upsert_with_retry, DeliveryStats, RetryPolicy};

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use vnstock_core::DailyRecord;

use crate::Result;

/// 증분 수집에 필요한 저장소 연산.
///
/// 업서트는 `(symbol, date)` 기준 멱등이어야 합니다.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 심볼의 저장된 행마다 거래일 하나 (저장 순서, 중복 포함).
    async fn stored_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// 심볼의 마지막 저장 거래일. 저장된 데이터가 없으면 `None`.
    async fn latest_stored_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        // 정렬 순서를 보장하지 않으므로 최댓값 사용
        Ok(self.stored_dates(symbol).await?.into_iter().max())
    }

    /// 레코드 하나를 삽입 또는 갱신.
    ///
    /// 검증 실패는 [`DataError::Validation`](crate::DataError::Validation),
    /// 일시적 실패는 재시도 가능한 오류로 반환합니다.
    async fn upsert(&self, record: &DailyRecord) -> Result<()>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    async fn stored_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        (**self).stored_dates(symbol).await
    }

    async fn latest_stored_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        (**self).latest_stored_date(symbol).await
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<()> {
        (**self).upsert(record).await
    }
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn stored_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        (**self).stored_dates(symbol).await
    }

    async fn latest_stored_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        (**self).latest_stored_date(symbol).await
    }

    async fn upsert(&self, record: &DailyRecord) -> Result<()> {
        (**self).upsert(record).await
    }
}
