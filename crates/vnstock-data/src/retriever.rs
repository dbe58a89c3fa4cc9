//! 페이지 단위 수집기.
//!
//! 하나의 수집기를 소스([`PagedSource`])와 정규화 테이블([`FieldTable`])로
//! 파라미터화해 stock-info와 charts history를 같은 경로로 처리합니다.
//!
//! # 종료 조건 (순서대로 검사)
//!
//! 1. 빈 페이지 → `exhausted`
//! 2. 페이지 크기보다 적은 항목 → `page-size-floor`
//! 3. `total`이 있고 `page * page_size >= total` → `total-reached`
//! 4. 다음 페이지가 `max_pages` 초과 → `max-pages-safety-stop`
//!
//! 전송 오류는 그때까지 받은 레코드를 유지한 채 `network-error`로 종료합니다.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn, Instrument};
use vnstock_core::{collect_span, CompletionReason, DailyRecord, FetchPlan, FetchResult, FetchWindow};

use crate::normalize::{extract_items, extract_total, FieldTable};
use crate::provider::{PageRequest, PagedSource};

/// 수집기 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverConfig {
    /// 페이지당 요청 항목 수
    pub page_size: u32,
    /// 안전 정지 페이지 수
    pub max_pages: u32,
    /// 페이지 간 대기 시간
    pub page_delay: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 1000,
            page_delay: Duration::from_millis(100),
        }
    }
}

impl RetrieverConfig {
    /// 페이지 크기 설정 (최소 1)
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 최대 페이지 수 설정 (최소 1)
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }
}

/// 페이지 단위 증분 수집기.
pub struct PaginatedRetriever<S> {
    source: S,
    table: FieldTable,
    config: RetrieverConfig,
}

impl<S: PagedSource> PaginatedRetriever<S> {
    pub fn new(source: S, table: FieldTable, config: RetrieverConfig) -> Self {
        let config = RetrieverConfig {
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
            ..config
        };
        Self {
            source,
            table,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// 계획에 따라 수집.
    ///
    /// [`FetchPlan::NothingToDo`]이면 요청 없이 빈 결과를 반환합니다.
    pub async fn fetch(&self, plan: &FetchPlan) -> FetchResult {
        match plan {
            FetchPlan::Fetch(window) => self.fetch_window(window).await,
            FetchPlan::NothingToDo { symbol, start, end } => {
                info!(symbol = %symbol, %start, %end, "이미 최신 상태, 수집 생략");
                FetchResult::nothing_to_do(symbol.clone())
            }
        }
    }

    /// 기간 전체를 페이지 단위로 수집.
    pub async fn fetch_window(&self, window: &FetchWindow) -> FetchResult {
        let span = collect_span!(window.symbol(), self.source.name());
        self.run(window).instrument(span).await
    }

    async fn run(&self, window: &FetchWindow) -> FetchResult {
        let symbol = window.symbol();
        let page_size = self.config.page_size;
        let max_pages = self.config.max_pages;

        let mut merged: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();
        let mut pages = 0usize;
        let mut errors = 0usize;
        let mut last_error: Option<String> = None;
        let mut page: u32 = 1;

        debug!(%window, page_size, max_pages, "페이지 수집 시작");

        let reason = loop {
            let request = PageRequest {
                symbol: symbol.to_string(),
                start: window.start(),
                end: window.end(),
                page,
                page_size,
            };

            let payload = match self.source.fetch_page(&request).await {
                Ok(payload) => Some(payload),
                Err(e) if e.is_transport() => {
                    errors += 1;
                    warn!(page, collected = merged.len(), error = %e, "페이지 요청 실패, 수집 중단");
                    last_error = Some(e.to_string());
                    break CompletionReason::NetworkError;
                }
                Err(e) => {
                    errors += 1;
                    warn!(page, error = %e, "응답 해석 실패, 빈 페이지로 처리");
                    last_error = Some(e.to_string());
                    None
                }
            };
            pages += 1;

            let items: &[serde_json::Value] = match payload.as_ref() {
                Some(payload) => match extract_items(payload) {
                    Some(items) => items,
                    None => {
                        errors += 1;
                        let message = format!("알 수 없는 응답 구조 (page {})", page);
                        warn!(page, "알 수 없는 응답 구조, 빈 페이지로 처리");
                        last_error = Some(message);
                        &[]
                    }
                },
                None => &[],
            };

            if items.is_empty() {
                break CompletionReason::Exhausted;
            }

            // 페이지 전체를 정규화한 뒤 병합
            let batch: Vec<DailyRecord> = items
                .iter()
                .filter_map(|item| self.table.normalize(symbol, item))
                .filter(|record| window.contains(record.date))
                .collect();

            debug!(page, items = items.len(), accepted = batch.len(), "페이지 수신");

            for record in batch {
                merged.insert(record.date, record);
            }

            if items.len() < page_size as usize {
                break CompletionReason::PageSizeFloor;
            }

            let total = payload.as_ref().and_then(extract_total).filter(|t| *t > 0);
            if let Some(total) = total {
                if u64::from(page) * u64::from(page_size) >= total {
                    break CompletionReason::TotalReached;
                }
            }

            if page >= max_pages {
                error!(
                    page,
                    max_pages,
                    collected = merged.len(),
                    "최대 페이지 수 도달, 안전 정지 (데이터가 남아 있을 수 있음)"
                );
                break CompletionReason::MaxPagesSafetyStop;
            }

            page += 1;
            if !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        };

        let records: Vec<DailyRecord> = merged.into_values().collect();

        info!(
            records = records.len(),
            pages,
            errors,
            reason = %reason,
            "페이지 수집 완료"
        );

        FetchResult {
            symbol: symbol.to_string(),
            records,
            pages,
            errors,
            reason,
            error: last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticPagedSource;
    use crate::DataError;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window() -> FetchWindow {
        FetchWindow::new("ACB", d(2025, 10, 1), d(2025, 10, 31)).unwrap()
    }

    fn retriever(source: StaticPagedSource, page_size: u32) -> PaginatedRetriever<StaticPagedSource> {
        let config = RetrieverConfig::default()
            .with_page_size(page_size)
            .with_page_delay(Duration::ZERO);
        PaginatedRetriever::new(source, FieldTable::ohlcv(), config)
    }

    #[tokio::test]
    async fn test_drops_out_of_window_rows() {
        let source = StaticPagedSource::from_payloads(vec![json!({"data": [
            {"date": "2025-09-30", "close": 1},
            {"date": "2025-10-01", "close": 2},
            {"date": "not a date", "close": 3}
        ]})]);
        let result = retriever(source, 10).fetch_window(&window()).await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].date, d(2025, 10, 1));
        assert_eq!(result.reason, CompletionReason::PageSizeFloor);
    }

    #[tokio::test]
    async fn test_unknown_shape_counts_as_error() {
        let source = StaticPagedSource::from_payloads(vec![json!({"message": "maintenance"})]);
        let result = retriever(source, 10).fetch_window(&window()).await;

        assert!(result.records.is_empty());
        assert_eq!(result.errors, 1);
        assert_eq!(result.reason, CompletionReason::Exhausted);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_non_transport_error_is_empty_page() {
        let source = StaticPagedSource::new(vec![Err(DataError::Shape("no t column".into()))]);
        let result = retriever(source, 10).fetch_window(&window()).await;

        assert_eq!(result.reason, CompletionReason::Exhausted);
        assert_eq!(result.pages, 1);
        assert_eq!(result.errors, 1);
    }

    #[tokio::test]
    async fn test_max_pages_safety_stop() {
        let full_page = |day: u32| json!([{"date": format!("2025-10-{:02}", day), "close": day}]);
        let source = StaticPagedSource::from_payloads(vec![full_page(1), full_page(2), full_page(3)]);
        let config = RetrieverConfig::default()
            .with_page_size(1)
            .with_max_pages(2)
            .with_page_delay(Duration::ZERO);
        let retriever = PaginatedRetriever::new(source, FieldTable::ohlcv(), config);

        let result = retriever.fetch_window(&window()).await;
        assert_eq!(result.reason, CompletionReason::MaxPagesSafetyStop);
        assert_eq!(result.pages, 2);
        assert_eq!(result.records.len(), 2);
        assert_eq!(retriever.source().call_count(), 2);
        assert!(!result.reason.is_complete());
    }

    #[test]
    fn test_config_clamps_page_size() {
        let config = RetrieverConfig::default().with_page_size(0).with_max_pages(0);
        assert_eq!(config.page_size, 1);
        assert_eq!(config.max_pages, 1);
    }
}
