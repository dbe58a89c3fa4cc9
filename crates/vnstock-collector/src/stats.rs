//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vnstock_core::{CompletionReason, FetchResult};
use vnstock_data::DeliveryStats;

/// 심볼 하나의 수집 결과 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolOutcome {
    /// 레코드를 받아 저장함
    Saved,
    /// 이미 최신 상태 (요청하지 않음)
    UpToDate,
    /// 조회는 성공했으나 데이터 없음
    Empty,
    /// 조회 또는 저장 실패
    Failed,
}

/// 심볼 하나의 수집 요약.
///
/// 심볼별로 만들어 [`CollectionStats::absorb`]로 합칩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub outcome: SymbolOutcome,
    pub reason: CompletionReason,
    /// 중복 제거 후 레코드 수
    pub fetched: usize,
    pub pages: usize,
    /// 페이지 수집 중 오류 수
    pub fetch_errors: usize,
    pub saved: usize,
    pub rejected: usize,
    pub failed: usize,
    /// 마지막 오류 메시지
    pub error: Option<String>,
}

impl SymbolReport {
    /// 수집 결과와 저장 결과로부터 요약 생성
    pub fn from_parts(result: &FetchResult, delivery: &DeliveryStats) -> Self {
        let outcome = if result.reason == CompletionReason::NothingToDo {
            SymbolOutcome::UpToDate
        } else if result.is_empty() {
            if result.reason == CompletionReason::NetworkError {
                SymbolOutcome::Failed
            } else {
                SymbolOutcome::Empty
            }
        } else if delivery.saved == 0 {
            SymbolOutcome::Failed
        } else {
            SymbolOutcome::Saved
        };

        Self {
            symbol: result.symbol.clone(),
            outcome,
            reason: result.reason,
            fetched: result.records.len(),
            pages: result.pages,
            fetch_errors: result.errors,
            saved: delivery.saved,
            rejected: delivery.rejected,
            failed: delivery.failed,
            error: result.error.clone(),
        }
    }
}

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 심볼 수
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 건너뛴 횟수 (이미 최신 데이터)
    pub skipped: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 처리한 페이지 수
    pub pages: usize,
    /// 받은 레코드 수 (중복 제거 후)
    pub records_fetched: usize,
    /// 저장된 레코드 수
    pub records_saved: usize,
    /// 드라이런에서 저장 대신 메모리에 기록한 레코드 수
    pub records_captured: usize,
    /// 검증 오류로 거부된 레코드 수
    pub records_rejected: usize,
    /// 재시도 후 실패한 레코드 수
    pub records_failed: usize,
    /// 최대 페이지 안전 정지 횟수
    pub safety_stops: usize,
    /// 드라이런 실행 여부
    pub dry_run: bool,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼 요약 반영
    pub fn absorb(&mut self, report: &SymbolReport) {
        self.total += 1;
        match report.outcome {
            SymbolOutcome::Saved => self.success += 1,
            SymbolOutcome::UpToDate => self.skipped += 1,
            SymbolOutcome::Empty => self.empty += 1,
            SymbolOutcome::Failed => self.errors += 1,
        }
        if report.reason == CompletionReason::MaxPagesSafetyStop {
            self.safety_stops += 1;
        }
        self.pages += report.pages;
        self.records_fetched += report.fetched;
        self.records_saved += report.saved;
        self.records_rejected += report.rejected;
        self.records_failed += report.failed;
    }

    /// 다른 실행 통계 합산
    pub fn merge(&mut self, other: &CollectionStats) {
        self.total += other.total;
        self.success += other.success;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.empty += other.empty;
        self.pages += other.pages;
        self.records_fetched += other.records_fetched;
        self.records_saved += other.records_saved;
        self.records_captured += other.records_captured;
        self.records_rejected += other.records_rejected;
        self.records_failed += other.records_failed;
        self.safety_stops += other.safety_stops;
        self.dry_run |= other.dry_run;
        self.elapsed += other.elapsed;
    }

    /// 드라이런 결과로 표시.
    ///
    /// 메모리에 기록된 레코드는 저장 수가 아니라 `records_captured`로 집계합니다.
    pub fn into_dry_run(mut self) -> Self {
        self.records_captured += self.records_saved;
        self.records_saved = 0;
        self.dry_run = true;
        self
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.success + self.skipped) as f64 / self.total as f64) * 100.0
        }
    }

    /// 하나 이상의 심볼이 저장되었거나 이미 최신이면 성공
    pub fn is_success(&self) -> bool {
        self.success + self.skipped > 0
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            dry_run = self.dry_run,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            pages = self.pages,
            records_fetched = self.records_fetched,
            records_saved = self.records_saved,
            records_captured = self.records_captured,
            records_rejected = self.records_rejected,
            records_failed = self.records_failed,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "{}",
            if self.dry_run { "수집 완료 (드라이런, 저장 안 함)" } else { "수집 완료" }
        );

        if self.safety_stops > 0 {
            tracing::error!(
                operation = operation,
                safety_stops = self.safety_stops,
                "최대 페이지 안전 정지 발생, 누락된 데이터가 있을 수 있습니다"
            );
        }
    }
}
