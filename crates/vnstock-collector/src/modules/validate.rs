//! 저장 데이터 검증 모듈.
//!
//! 수집이 끝난 뒤 심볼별로 저장된 행을 다시 읽어 거래일 중복을 확인합니다.
//! 업서트가 `(symbol, date)` 기준으로 멱등이면 중복 행은 없어야 합니다.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use vnstock_data::{HttpRecordStore, RecordStore, SsiClient};

use super::ohlcv_collect::CollectRequest;
use super::symbol_list::resolve_symbols;
use crate::{CollectorConfig, Result};

/// 심볼 검증 결과 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// 거래일당 1행
    Complete,
    /// 같은 거래일 행이 2개 이상
    HasDuplicates,
    /// 저장된 행 없음
    NoData,
    /// 조회 실패
    Error,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::HasDuplicates => "has_duplicates",
            Self::NoData => "no_data",
            Self::Error => "error",
        }
    }
}

/// 심볼 하나의 저장 데이터 검증 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub symbol: String,
    /// 저장된 행 수
    pub total_records: usize,
    pub unique_dates: usize,
    /// `total_records - unique_dates`
    pub duplicate_records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub status: ValidationStatus,
    pub error: Option<String>,
}

impl ValidationReport {
    /// 저장된 행의 거래일 목록으로 결과 계산
    pub fn from_dates(symbol: impl Into<String>, dates: &[NaiveDate]) -> Self {
        let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let duplicate_records = dates.len() - unique.len();

        let status = if dates.is_empty() {
            ValidationStatus::NoData
        } else if duplicate_records > 0 {
            ValidationStatus::HasDuplicates
        } else {
            ValidationStatus::Complete
        };

        Self {
            symbol: symbol.into(),
            total_records: dates.len(),
            unique_dates: unique.len(),
            duplicate_records,
            first_date: unique.first().copied(),
            last_date: unique.last().copied(),
            status,
            error: None,
        }
    }

    fn failed(symbol: &str, error: String) -> Self {
        Self {
            error: Some(error),
            status: ValidationStatus::Error,
            ..Self::from_dates(symbol, &[])
        }
    }
}

/// 심볼 하나 검증
pub async fn validate_symbol<R: RecordStore + ?Sized>(store: &R, symbol: &str) -> ValidationReport {
    let report = match store.stored_dates(symbol).await {
        Ok(dates) => ValidationReport::from_dates(symbol, &dates),
        Err(e) => ValidationReport::failed(symbol, e.to_string()),
    };

    match report.status {
        ValidationStatus::HasDuplicates => tracing::warn!(
            symbol = symbol,
            total = report.total_records,
            duplicates = report.duplicate_records,
            "중복 거래일 발견"
        ),
        ValidationStatus::Error => tracing::error!(
            symbol = symbol,
            error = report.error.as_deref().unwrap_or_default(),
            "저장 데이터 조회 실패"
        ),
        _ => tracing::debug!(
            symbol = symbol,
            status = report.status.as_str(),
            total = report.total_records,
            first = ?report.first_date,
            last = ?report.last_date,
            "저장 데이터 검증"
        ),
    }
    report
}

/// 종목 목록을 순서대로 검증
pub async fn validate_symbols<R: RecordStore + ?Sized>(
    store: &R,
    symbols: &[String],
) -> Vec<ValidationReport> {
    let mut reports = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        reports.push(validate_symbol(store, symbol).await);
    }
    reports
}

/// 검증 결과 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub complete: usize,
    pub has_duplicates: usize,
    pub no_data: usize,
    pub errors: usize,
    /// 전체 중복 행 수
    pub duplicate_records: usize,
}

impl ValidationSummary {
    pub fn from_reports(reports: &[ValidationReport]) -> Self {
        let mut summary = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                ValidationStatus::Complete => summary.complete += 1,
                ValidationStatus::HasDuplicates => summary.has_duplicates += 1,
                ValidationStatus::NoData => summary.no_data += 1,
                ValidationStatus::Error => summary.errors += 1,
            }
            summary.duplicate_records += report.duplicate_records;
        }
        summary
    }

    /// 중복과 조회 실패가 없으면 통과
    pub fn is_clean(&self) -> bool {
        self.has_duplicates == 0 && self.errors == 0
    }

    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            complete = self.complete,
            has_duplicates = self.has_duplicates,
            no_data = self.no_data,
            errors = self.errors,
            duplicate_records = self.duplicate_records,
            "저장 데이터 검증 완료"
        );
    }
}

/// 수집 요청과 같은 종목/테이블의 저장 데이터 검증
pub async fn validate_stored(
    config: &CollectorConfig,
    request: &CollectRequest,
) -> Result<Vec<ValidationReport>> {
    let client = SsiClient::new(config.ssi_config())?;
    let group = request
        .group
        .clone()
        .unwrap_or_else(|| config.symbols.group.clone());
    let max_symbols = request.max_symbols.or(config.symbols.max_symbols);
    let symbols =
        resolve_symbols(&client, request.symbols.as_deref(), &group, max_symbols).await?;

    let store = HttpRecordStore::new(config.api_url.clone(), config.retry.timeout())?
        .with_table(request.store_table(config));
    tracing::info!(
        symbols = symbols.len(),
        table = store.table().path(),
        "저장 데이터 검증 시작"
    );

    Ok(validate_symbols(&store, &symbols).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnstock_core::DailyRecord;
    use vnstock_data::MemoryRecordStore;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn test_report_from_dates() {
        let report = ValidationReport::from_dates("ACB", &[d(2), d(1), d(2), d(3)]);
        assert_eq!(report.total_records, 4);
        assert_eq!(report.unique_dates, 3);
        assert_eq!(report.duplicate_records, 1);
        assert_eq!(report.first_date, Some(d(1)));
        assert_eq!(report.last_date, Some(d(3)));
        assert_eq!(report.status, ValidationStatus::HasDuplicates);

        let report = ValidationReport::from_dates("ACB", &[d(1), d(2)]);
        assert_eq!(report.status, ValidationStatus::Complete);

        let report = ValidationReport::from_dates("NEW", &[]);
        assert_eq!(report.status, ValidationStatus::NoData);
        assert_eq!(report.status.as_str(), "no_data");
    }

    #[tokio::test]
    async fn test_repeated_upserts_stay_complete() {
        let store = MemoryRecordStore::new();
        for _ in 0..2 {
            for day in 1..=3 {
                store.upsert(&DailyRecord::new("ACB", d(day))).await.unwrap();
            }
        }

        let reports = validate_symbols(&store, &["ACB".to_string(), "FPT".to_string()]).await;
        assert_eq!(reports[0].status, ValidationStatus::Complete);
        assert_eq!(reports[0].total_records, 3);
        assert_eq!(reports[1].status, ValidationStatus::NoData);

        let summary = ValidationSummary::from_reports(&reports);
        assert_eq!(summary.complete, 1);
        assert_eq!(summary.no_data, 1);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_summary_not_clean_with_duplicates() {
        let reports = vec![
            ValidationReport::from_dates("ACB", &[d(1), d(1)]),
            ValidationReport::from_dates("FPT", &[d(1)]),
        ];
        let summary = ValidationSummary::from_reports(&reports);
        assert_eq!(summary.has_duplicates, 1);
        assert_eq!(summary.duplicate_records, 1);
        assert!(!summary.is_clean());
    }
}
