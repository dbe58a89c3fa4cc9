//! 업서트 재시도.

use std::time::Duration;

use tracing::{debug, info, warn};
use vnstock_core::DailyRecord;

use super::RecordStore;
use crate::Result;

/// 지수 백오프 재시도 정책.
///
/// n번째 재시도 전 대기 시간은 `base_delay * 2^(n-1)`이며 `max_delay`를 넘지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도를 포함한 최대 시도 횟수
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// 대기 없는 정책 (테스트용)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// `attempt`번째 시도가 실패한 뒤의 대기 시간 (1부터 시작)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// 재시도 포함 단건 업서트.
///
/// 재시도 가능한 오류만 재시도하고, 검증 오류는 즉시 반환합니다.
pub async fn upsert_with_retry<R>(store: &R, record: &DailyRecord, policy: &RetryPolicy) -> Result<()>
where
    R: RecordStore + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match store.upsert(record).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                debug!(
                    symbol = %record.symbol,
                    date = %record.date,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "업서트 재시도 예정"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 일괄 전달 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// 전달을 시도한 레코드 수
    pub attempted: usize,
    /// 저장 성공
    pub saved: usize,
    /// 검증 오류로 거부됨
    pub rejected: usize,
    /// 재시도 후에도 실패
    pub failed: usize,
}

impl DeliveryStats {
    /// 모두 저장되었는지
    pub fn is_clean(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// 레코드를 순서대로 저장소에 전달.
///
/// 실패한 레코드는 집계만 하고 나머지 전달을 계속합니다.
pub async fn deliver<R>(store: &R, records: &[DailyRecord], policy: &RetryPolicy) -> DeliveryStats
where
    R: RecordStore + ?Sized,
{
    let mut stats = DeliveryStats::default();

    for record in records {
        stats.attempted += 1;
        match upsert_with_retry(store, record, policy).await {
            Ok(()) => stats.saved += 1,
            Err(e) if e.is_retryable() => {
                stats.failed += 1;
                warn!(
                    symbol = %record.symbol,
                    date = %record.date,
                    attempts = policy.max_attempts,
                    error = %e,
                    "업서트 최종 실패"
                );
            }
            Err(e) => {
                stats.rejected += 1;
                warn!(symbol = %record.symbol, date = %record.date, error = %e, "레코드 거부됨");
            }
        }
    }

    if let Some(first) = records.first() {
        info!(
            symbol = %first.symbol,
            attempted = stats.attempted,
            saved = stats.saved,
            rejected = stats.rejected,
            failed = stats.failed,
            "저장 완료"
        );
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::DataError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    /// 처음 `failures`번은 503을 반환하는 저장소
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn stored_dates(&self, _symbol: &str) -> Result<Vec<NaiveDate>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, _record: &DailyRecord) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(DataError::HttpStatus { status: 503, body: "busy".into() })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_delay_is_capped_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(8));
        assert_eq!(policy.delay_for(60), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let store = FlakyStore { failures: 2, calls: AtomicU32::new(0) };
        let record = DailyRecord::new("ACB", d(1));

        upsert_with_retry(&store, &record, &RetryPolicy::immediate(3)).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = FlakyStore { failures: 10, calls: AtomicU32::new(0) };
        let records = vec![DailyRecord::new("ACB", d(1))];

        let stats = deliver(&store, &records, &RetryPolicy::immediate(3)).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.saved, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried_and_batch_continues() {
        let store = MemoryRecordStore::new().rejecting(d(2));
        let records = vec![
            DailyRecord::new("ACB", d(1)),
            DailyRecord::new("ACB", d(2)),
            DailyRecord::new("ACB", d(3)),
        ];

        let stats = deliver(&store, &records, &RetryPolicy::immediate(3)).await;
        assert_eq!(
            stats,
            DeliveryStats { attempted: 3, saved: 2, rejected: 1, failed: 0 }
        );
        assert_eq!(store.upsert_calls(), 3);
        assert!(!stats.is_clean());
    }
}
