//! 일별 시세 증분 수집 모듈.
//!
//! 심볼마다 기간 계산 → 페이지 수집 → 업서트를 순서대로 수행하고,
//! 결과를 [`SymbolReport`]로 요약해 [`CollectionStats`]에 합칩니다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::time::{Duration, Instant};
use vnstock_core::{DailyRecord, FetchPlan};
use vnstock_data::{
    deliver, market_now, ChartHistorySource, DateOverride, DeliveryStats, FieldTable,
    HttpRecordStore, MemoryRecordStore, PagedSource, PaginatedRetriever, RecordStore,
    RetryPolicy, SsiClient, StockInfoSource, StoreTable, WindowResolver,
};

use super::symbol_list::resolve_symbols;
use crate::{CollectionStats, CollectorConfig, Result, SourceKind, SymbolReport};

/// 한 번의 수집 실행 요청 (CLI 옵션).
#[derive(Debug, Clone, Default)]
pub struct CollectRequest {
    /// 쉼표로 구분한 종목 (없으면 그룹 조회)
    pub symbols: Option<String>,
    /// 종목 그룹 (없으면 설정값)
    pub group: Option<String>,
    pub max_symbols: Option<usize>,
    /// 지정 시작/종료일
    pub overrides: DateOverride,
    pub source: Option<SourceKind>,
    pub resolution: Option<String>,
    /// 저장소 조회 없이 전체 기간 수집
    pub full: bool,
    /// 저장하지 않고 수집만
    pub dry_run: bool,
}

impl CollectRequest {
    /// 요청 또는 설정의 데이터 소스
    pub fn source_kind(&self, config: &CollectorConfig) -> SourceKind {
        self.source.unwrap_or(config.fetch.source)
    }

    /// 요청 또는 설정의 charts 해상도
    pub fn chart_resolution(&self, config: &CollectorConfig) -> String {
        self.resolution
            .clone()
            .unwrap_or_else(|| config.fetch.resolution.clone())
    }

    /// 데이터 소스에 맞는 저장 테이블
    pub fn store_table(&self, config: &CollectorConfig) -> StoreTable {
        match self.source_kind(config) {
            SourceKind::StockInfo => StoreTable::StockStatistics,
            SourceKind::Charts => StoreTable::StockPrices {
                resolution: self.chart_resolution(config),
            },
        }
    }
}

/// 드라이런 저장소.
///
/// 마지막 저장일은 실제 저장소에서 읽고, 업서트는 메모리에만 기록합니다.
pub struct DryRunStore<R> {
    inner: R,
    sink: MemoryRecordStore,
}

impl<R> DryRunStore<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            sink: MemoryRecordStore::new(),
        }
    }

    /// 저장되었을 레코드 수
    pub fn captured(&self) -> usize {
        self.sink.len()
    }
}

#[async_trait]
impl<R: RecordStore> RecordStore for DryRunStore<R> {
    async fn stored_dates(&self, symbol: &str) -> vnstock_data::Result<Vec<NaiveDate>> {
        self.inner.stored_dates(symbol).await
    }

    async fn latest_stored_date(&self, symbol: &str) -> vnstock_data::Result<Option<NaiveDate>> {
        self.inner.latest_stored_date(symbol).await
    }

    async fn upsert(&self, record: &DailyRecord) -> vnstock_data::Result<()> {
        self.sink.upsert(record).await
    }
}

/// 심볼 단위 수집기.
pub struct Collector<S, R> {
    retriever: PaginatedRetriever<S>,
    store: R,
    resolver: WindowResolver,
    retry: RetryPolicy,
    symbol_delay: Duration,
    incremental: bool,
}

impl<S: PagedSource, R: RecordStore> Collector<S, R> {
    pub fn new(
        retriever: PaginatedRetriever<S>,
        store: R,
        resolver: WindowResolver,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            retriever,
            store,
            resolver,
            retry,
            symbol_delay: Duration::ZERO,
            incremental: true,
        }
    }

    /// 심볼 간 대기 시간
    pub fn with_symbol_delay(mut self, delay: Duration) -> Self {
        self.symbol_delay = delay;
        self
    }

    /// `false`이면 저장소의 마지막 저장일을 조회하지 않음 (전체 기간 수집)
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn retriever(&self) -> &PaginatedRetriever<S> {
        &self.retriever
    }

    /// 수집 계획 계산
    pub async fn plan(&self, symbol: &str, overrides: DateOverride, now: DateTime<Tz>) -> FetchPlan {
        if self.incremental {
            self.resolver
                .resolve_incremental(&self.store, symbol, overrides, now)
                .await
        } else {
            self.resolver.resolve(symbol, None, overrides, now)
        }
    }

    /// 심볼 하나 수집 및 저장
    pub async fn collect_symbol(
        &self,
        symbol: &str,
        overrides: DateOverride,
        now: DateTime<Tz>,
    ) -> SymbolReport {
        let plan = self.plan(symbol, overrides, now).await;
        if let Some(window) = plan.window() {
            tracing::debug!(symbol = symbol, window = %window, days = window.days(), "수집 기간 결정");
        }

        let result = self.retriever.fetch(&plan).await;

        let priceless = result.records.iter().filter(|r| !r.has_prices()).count();
        if priceless > 0 {
            tracing::warn!(symbol = symbol, count = priceless, "가격 정보 없는 레코드");
        }

        let delivery = if result.is_empty() {
            DeliveryStats::default()
        } else {
            deliver(&self.store, &result.records, &self.retry).await
        };

        let report = SymbolReport::from_parts(&result, &delivery);
        match report.outcome {
            crate::SymbolOutcome::Failed => tracing::error!(
                symbol = symbol,
                reason = %report.reason,
                fetched = report.fetched,
                error = report.error.as_deref().unwrap_or("저장 실패"),
                "수집 실패"
            ),
            _ => tracing::info!(
                symbol = symbol,
                outcome = ?report.outcome,
                reason = %report.reason,
                fetched = report.fetched,
                saved = report.saved,
                "수집 및 저장 완료"
            ),
        }
        report
    }

    /// 종목 목록을 순서대로 수집
    pub async fn collect(&self, symbols: &[String], overrides: DateOverride) -> CollectionStats {
        let start = Instant::now();
        let mut stats = CollectionStats::new();

        for (idx, symbol) in symbols.iter().enumerate() {
            tracing::debug!(
                symbol = symbol.as_str(),
                progress = format!("{}/{}", idx + 1, symbols.len()),
                "수집 시작"
            );

            let report = self.collect_symbol(symbol, overrides, market_now()).await;
            stats.absorb(&report);

            // Rate limiting
            if idx + 1 < symbols.len() && !self.symbol_delay.is_zero() {
                tokio::time::sleep(self.symbol_delay).await;
            }
        }

        stats.elapsed = start.elapsed();
        stats
    }
}

/// 일별 시세 수집
pub async fn collect_ohlcv(
    config: &CollectorConfig,
    request: CollectRequest,
) -> Result<CollectionStats> {
    tracing::info!("일별 시세 수집 시작");

    let client = SsiClient::new(config.ssi_config())?;
    let group = request
        .group
        .clone()
        .unwrap_or_else(|| config.symbols.group.clone());
    let max_symbols = request.max_symbols.or(config.symbols.max_symbols);

    let symbols =
        resolve_symbols(&client, request.symbols.as_deref(), &group, max_symbols).await?;
    if symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        return Ok(CollectionStats::new());
    }

    let (source, table): (Box<dyn PagedSource>, FieldTable) = match request.source_kind(config) {
        SourceKind::StockInfo => (
            Box::new(StockInfoSource::new(client)),
            FieldTable::stock_info(),
        ),
        SourceKind::Charts => (
            Box::new(ChartHistorySource::new(
                client,
                request.chart_resolution(config),
            )?),
            FieldTable::ohlcv(),
        ),
    };

    let store_table = request.store_table(config);
    let http_store = HttpRecordStore::new(config.api_url.clone(), config.retry.timeout())?
        .with_table(store_table.clone());
    let store: Box<dyn RecordStore> = if request.dry_run {
        tracing::info!("드라이런: 저장하지 않고 수집만 수행");
        Box::new(DryRunStore::new(http_store))
    } else {
        Box::new(http_store)
    };

    tracing::info!(
        symbols = symbols.len(),
        source = source.name(),
        table = store_table.path(),
        incremental = !request.full,
        start_override = ?request.overrides.start,
        end_override = ?request.overrides.end,
        "수집 범위 설정 완료"
    );

    let retriever = PaginatedRetriever::new(source, table, config.retriever_config());
    let collector = Collector::new(
        retriever,
        store,
        WindowResolver::new(config.resolver_config()),
        config.retry_policy(),
    )
    .with_symbol_delay(config.fetch.symbol_delay())
    .with_incremental(!request.full);

    let stats = collector.collect(&symbols, request.overrides).await;
    Ok(if request.dry_run {
        stats.into_dry_run()
    } else {
        stats
    })
}
