//! 수집 루프 통합 테스트.

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use vnstock_collector::modules::{
    collect_ohlcv, validate_stored, CollectRequest, Collector, ValidationStatus,
};
use vnstock_collector::{
    CollectionStats, CollectorConfig, CollectorError, SourceKind, SymbolOutcome,
};
use vnstock_core::{CompletionReason, DailyRecord};
use vnstock_data::{
    DataError, DateOverride, FieldTable, MemoryRecordStore, PaginatedRetriever, RetrieverConfig,
    RetryPolicy, StaticPagedSource, WindowResolver, MARKET_TZ,
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
}

fn morning(day: u32) -> DateTime<Tz> {
    MARKET_TZ.with_ymd_and_hms(2025, 10, day, 10, 0, 0).unwrap()
}

fn collector(
    source: StaticPagedSource,
    store: MemoryRecordStore,
) -> Collector<StaticPagedSource, MemoryRecordStore> {
    let retriever = PaginatedRetriever::new(
        source,
        FieldTable::stock_info(),
        RetrieverConfig::default().with_page_delay(Duration::ZERO),
    );
    Collector::new(retriever, store, WindowResolver::default(), RetryPolicy::immediate(3))
}

#[tokio::test]
async fn test_incremental_collect_saves_new_days() {
    let source = StaticPagedSource::from_payloads(vec![json!({
        "data": [
            {"tradingDate": "01/10/2025", "close": "25,150", "totalMatchVol": "1,200,300"},
            {"tradingDate": "02/10/2025", "close": "25,400", "totalMatchVol": "980,000"},
            {"tradingDate": "03/10/2025", "close": "25,300", "totalMatchVol": "870,000"}
        ]
    })]);
    let store = MemoryRecordStore::with_records(vec![DailyRecord::new("ACB", d(1))]);
    let collector = collector(source, store);

    let report = collector
        .collect_symbol("ACB", DateOverride::default(), morning(4))
        .await;

    // 10/01은 이미 저장되어 있으므로 10/02 ~ 10/03만 요청
    let request = &collector.retriever().source().requests()[0];
    assert_eq!((request.start, request.end), (d(2), d(3)));

    assert_eq!(report.outcome, SymbolOutcome::Saved);
    assert_eq!(report.reason, CompletionReason::PageSizeFloor);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.saved, 2);
    assert_eq!(collector.store().records_for("ACB").len(), 3);
}

#[tokio::test]
async fn test_up_to_date_symbol_is_skipped() {
    let source = StaticPagedSource::from_payloads(vec![json!([])]);
    let store = MemoryRecordStore::with_records(vec![DailyRecord::new("ACB", d(3))]);
    let collector = collector(source, store);

    let report = collector
        .collect_symbol("ACB", DateOverride::default(), morning(4))
        .await;

    assert_eq!(report.outcome, SymbolOutcome::UpToDate);
    assert_eq!(collector.retriever().source().call_count(), 0);
    assert_eq!(collector.store().upsert_calls(), 0);

    let mut stats = CollectionStats::new();
    stats.absorb(&report);
    assert!(stats.is_success());
}

#[tokio::test]
async fn test_rejected_records_do_not_stop_batch() {
    let source = StaticPagedSource::from_payloads(vec![json!([
        {"date": "2025-10-01", "close": 1},
        {"date": "2025-10-02", "close": 2},
        {"date": "2025-10-03", "close": 3}
    ])]);
    let store = MemoryRecordStore::new().rejecting(d(2));
    let collector = collector(source, store);
    let overrides = DateOverride::new(Some(d(1)), Some(d(3)));

    let report = collector.collect_symbol("FPT", overrides, morning(4)).await;

    assert_eq!(report.outcome, SymbolOutcome::Saved);
    assert_eq!(report.saved, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(collector.store().upsert_calls(), 3);
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let source = StaticPagedSource::new(vec![Err(DataError::Transport(
        "connection refused".to_string(),
    ))]);
    let collector = collector(source, MemoryRecordStore::new());
    let overrides = DateOverride::new(Some(d(1)), Some(d(3)));

    let report = collector.collect_symbol("HPG", overrides, morning(4)).await;

    assert_eq!(report.outcome, SymbolOutcome::Failed);
    assert_eq!(report.reason, CompletionReason::NetworkError);
    assert!(report.error.unwrap().contains("connection refused"));

    let mut stats = CollectionStats::new();
    stats.absorb(&collector.collect_symbol("HPG", overrides, morning(4)).await);
    assert!(!stats.is_success());
}

#[tokio::test]
async fn test_failed_symbol_does_not_stop_later_symbols() {
    let source = StaticPagedSource::from_payloads(vec![json!([
        {"date": "2025-10-01", "close": 1},
        {"date": "2025-10-02", "close": 2}
    ])])
    .with_symbol_pages(
        "HPG",
        vec![Err(DataError::Transport("connection refused".to_string()))],
    );
    let delay = Duration::from_millis(300);
    let collector = collector(source, MemoryRecordStore::new()).with_symbol_delay(delay);
    let symbols = vec!["HPG".to_string(), "FPT".to_string()];

    let stats = collector
        .collect(&symbols, DateOverride::new(Some(d(1)), Some(d(2))))
        .await;

    assert_eq!(stats.total, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.records_saved, 2);
    assert!(stats.is_success());
    assert_eq!(collector.store().records_for("FPT").len(), 2);

    let requested: Vec<String> = collector
        .retriever()
        .source()
        .requests()
        .into_iter()
        .map(|r| r.symbol)
        .collect();
    assert_eq!(requested, vec!["HPG", "FPT"]);

    // 심볼 사이 대기는 한 번 (마지막 심볼 뒤에는 없음)
    assert!(stats.elapsed >= delay);
    assert!(stats.elapsed < delay * 2);
}

fn config_for(server: &Server) -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.api_url = server.url();
    config.ssi.stock_info_url = format!("{}/statistics/company/ssmi/stock-info", server.url());
    config.ssi.charts_url = format!("{}/statistics/charts/history", server.url());
    config.ssi.group_url = format!("{}/stock/group", server.url());
    config.fetch.page_delay_ms = 0;
    config.fetch.symbol_delay_ms = 0;
    config.retry.base_delay_ms = 0;
    config.retry.max_delay_ms = 0;
    config
}

#[tokio::test]
async fn test_collect_ohlcv_end_to_end() {
    let mut server = Server::new_async().await;
    let group = server
        .mock("GET", "/stock/group/VN30")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"stockSymbol": "ACB"}, {"stockSymbol": "FPT"}]}).to_string())
        .create_async()
        .await;
    let acb = server
        .mock("GET", "/statistics/company/ssmi/stock-info")
        .match_query(Matcher::UrlEncoded("symbol".into(), "ACB".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"data": [
                {"tradingDate": "01/10/2025", "close": "25,150"},
                {"tradingDate": "02/10/2025", "close": "25,400"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let saved = server
        .mock("POST", "/stock-statistics")
        .match_body(Matcher::PartialJson(json!({"symbol": "ACB"})))
        .with_status(201)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let request = CollectRequest {
        group: Some("VN30".to_string()),
        max_symbols: Some(1),
        overrides: DateOverride::new(Some(d(1)), Some(d(3))),
        ..CollectRequest::default()
    };
    let stats = collect_ohlcv(&config_for(&server), request).await.unwrap();

    group.assert_async().await;
    acb.assert_async().await;
    saved.assert_async().await;
    assert_eq!(stats.total, 1);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.records_saved, 2);
    assert!(stats.is_success());
}

#[tokio::test]
async fn test_collect_ohlcv_dry_run_does_not_post() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/statistics/company/ssmi/stock-info")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"tradingDate": "01/10/2025", "close": "25,150"}]).to_string())
        .create_async()
        .await;
    let posts = server
        .mock("POST", "/stock-statistics")
        .expect(0)
        .create_async()
        .await;

    let request = CollectRequest {
        symbols: Some("acb".to_string()),
        overrides: DateOverride::new(Some(d(1)), Some(d(3))),
        dry_run: true,
        ..CollectRequest::default()
    };
    let stats = collect_ohlcv(&config_for(&server), request).await.unwrap();

    posts.assert_async().await;
    assert!(stats.dry_run);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.records_saved, 0);
    assert_eq!(stats.records_captured, 1);
}

#[tokio::test]
async fn test_charts_collect_uses_stock_prices_table() {
    let mut server = Server::new_async().await;
    let stored = server
        .mock("GET", "/stock-prices")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "VNINDEX".into()),
            Matcher::UrlEncoded("resolution".into(), "1d".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"symbol": "VNINDEX", "timestamp": "2025-10-01T00:00:00"}]).to_string())
        .create_async()
        .await;
    // 10/01까지 저장되어 있으므로 10/02 00:00 (+07:00)부터 요청
    let history = server
        .mock("GET", "/statistics/charts/history")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("symbol".into(), "VNINDEX".into()),
            Matcher::UrlEncoded("resolution".into(), "1d".into()),
            Matcher::UrlEncoded("from".into(), "1759338000".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"data": {
                "t": [1759338000, 1759424400],
                "o": [1650.1, 1660.0],
                "h": [1665.0, 1671.2],
                "l": [1645.3, 1655.0],
                "c": [1660.5, 1668.9],
                "v": [812000000, 790000000],
                "s": "ok"
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let prices = server
        .mock("POST", "/stock-prices")
        .match_body(Matcher::PartialJson(
            json!({"symbol": "VNINDEX", "resolution": "1d", "status": "ok"}),
        ))
        .with_status(201)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;
    let statistics = server
        .mock("POST", "/stock-statistics")
        .expect(0)
        .create_async()
        .await;
    let statistics_lookup = server
        .mock("GET", "/stock-statistics")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let request = CollectRequest {
        symbols: Some("VNINDEX".to_string()),
        source: Some(SourceKind::Charts),
        overrides: DateOverride::new(None, Some(d(3))),
        ..CollectRequest::default()
    };
    let stats = collect_ohlcv(&config_for(&server), request).await.unwrap();

    stored.assert_async().await;
    history.assert_async().await;
    prices.assert_async().await;
    statistics.assert_async().await;
    statistics_lookup.assert_async().await;
    assert_eq!(stats.success, 1);
    assert_eq!(stats.records_saved, 2);
}

#[tokio::test]
async fn test_charts_intraday_resolution_is_rejected() {
    let server = Server::new_async().await;
    let request = CollectRequest {
        symbols: Some("VNINDEX".to_string()),
        source: Some(SourceKind::Charts),
        resolution: Some("60".to_string()),
        ..CollectRequest::default()
    };

    let err = collect_ohlcv(&config_for(&server), request).await.unwrap_err();
    assert!(matches!(err, CollectorError::Config(_)));
}

#[tokio::test]
async fn test_validate_stored_reports_duplicates() {
    let mut server = Server::new_async().await;
    let _acb = server
        .mock("GET", "/stock-statistics")
        .match_query(Matcher::UrlEncoded("symbol".into(), "ACB".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"symbol": "ACB", "date": "2025-10-01"},
                {"symbol": "ACB", "date": "2025-10-02"},
                {"symbol": "ACB", "date": "2025-10-02"}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let _fpt = server
        .mock("GET", "/stock-statistics")
        .match_query(Matcher::UrlEncoded("symbol".into(), "FPT".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"symbol": "FPT", "date": "2025-10-01"}]).to_string())
        .create_async()
        .await;
    let _hpg = server
        .mock("GET", "/stock-statistics")
        .match_query(Matcher::UrlEncoded("symbol".into(), "HPG".into()))
        .with_status(500)
        .create_async()
        .await;

    let request = CollectRequest {
        symbols: Some("ACB,FPT,HPG".to_string()),
        ..CollectRequest::default()
    };
    let reports = validate_stored(&config_for(&server), &request).await.unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].status, ValidationStatus::HasDuplicates);
    assert_eq!(reports[0].duplicate_records, 1);
    assert_eq!(reports[0].unique_dates, 2);
    assert_eq!(reports[1].status, ValidationStatus::Complete);
    assert_eq!(reports[2].status, ValidationStatus::Error);
}
