//! vnstock 수집기 CLI.

use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use vnstock_collector::modules::{self, CollectRequest, ValidationSummary};
use vnstock_collector::{CollectionStats, CollectorConfig, SourceKind};
use vnstock_core::{init_logging, LogConfig, LogFormat};
use vnstock_data::DateOverride;

#[derive(Parser)]
#[command(name = "vnstock-collector")]
#[command(about = "SSI iBoard incremental daily statistics collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact). 없으면 LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 일별 시세 증분 수집
    Collect(CollectArgs),

    /// 종목 그룹 구성 종목 출력
    Symbols {
        /// 종목 그룹 (기본: SYMBOL_GROUP 또는 VN100)
        #[arg(long)]
        group: Option<String>,

        /// 최대 종목 수
        #[arg(long)]
        max_symbols: Option<usize>,
    },

    /// 데몬 모드: 주기적으로 수집 실행
    Daemon(CollectArgs),

    /// 저장 데이터 검증 (거래일 중복 확인)
    Validate(TargetArgs),
}

/// 수집/검증 대상
#[derive(Args, Clone)]
struct TargetArgs {
    /// 특정 심볼만 (쉼표로 구분, 예: "ACB,FPT")
    #[arg(long)]
    symbols: Option<String>,

    /// 종목 그룹 (예: VN100)
    #[arg(long)]
    group: Option<String>,

    /// 최대 종목 수
    #[arg(long)]
    max_symbols: Option<usize>,

    /// 데이터 소스 (저장 테이블도 소스에 따라 결정)
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// charts 해상도 (1d, 1w, 1M)
    #[arg(long)]
    resolution: Option<String>,

    /// 영속화 API 주소
    #[arg(long)]
    api_url: Option<String>,
}

impl TargetArgs {
    fn apply(&self, config: &mut CollectorConfig) {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
    }

    fn request(&self) -> CollectRequest {
        CollectRequest {
            symbols: self.symbols.clone(),
            group: self.group.clone(),
            max_symbols: self.max_symbols,
            source: self.source,
            resolution: self.resolution.clone(),
            ..CollectRequest::default()
        }
    }
}

#[derive(Args, Clone)]
struct CollectArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// 수집 시작일 (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// 수집 종료일 (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// 저장된 마지막 날짜를 무시하고 전체 기간 수집
    #[arg(long)]
    full: bool,

    /// 저장하지 않고 수집만 수행
    #[arg(long)]
    dry_run: bool,

    /// 수집 후 저장 데이터 검증
    #[arg(long)]
    validate: bool,

    /// 페이지당 항목 수
    #[arg(long)]
    page_size: Option<u32>,

    /// 최대 페이지 수 (안전 정지)
    #[arg(long)]
    max_pages: Option<u32>,
}

impl CollectArgs {
    /// CLI 옵션을 설정에 반영
    fn apply(&self, config: &mut CollectorConfig) {
        self.target.apply(config);
        if let Some(page_size) = self.page_size {
            config.fetch.page_size = page_size;
        }
        if let Some(max_pages) = self.max_pages {
            config.fetch.max_pages = max_pages;
        }
    }

    fn request(&self) -> CollectRequest {
        CollectRequest {
            overrides: DateOverride::new(self.start, self.end),
            full: self.full,
            dry_run: self.dry_run,
            ..self.target.request()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = cli.log_format.or_else(LogFormat::from_env).unwrap_or_default();
    let log_config = LogConfig::for_crates(
        &cli.log_level,
        &["vnstock_collector", "vnstock_data", "vnstock_core"],
    )
    .with_format(log_format);
    if let Err(e) = init_logging(log_config) {
        eprintln!("로깅 초기화 실패: {}", e);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = format!("{:#}", e), "수집기 실행 실패");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    tracing::info!("vnstock Data Collector 시작");

    let mut config = CollectorConfig::from_env().context("설정 로드 실패")?;
    tracing::debug!(api_url = %config.api_url, "설정 로드 완료");

    let ok = match cli.command {
        Commands::Collect(args) => {
            args.apply(&mut config);
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("종료 신호 수신, 진행 중인 페이지는 저장하지 않고 종료");
                    false
                }
                result = modules::collect_ohlcv(&config, args.request()) => {
                    let stats = result.context("일별 시세 수집 실패")?;
                    let collected = report(&stats);
                    if args.validate && !args.dry_run {
                        validate(&config, &args.request()).await? && collected
                    } else {
                        collected
                    }
                }
            }
        }
        Commands::Symbols { group, max_symbols } => {
            let group = group.unwrap_or_else(|| config.symbols.group.clone());
            let symbols = modules::list_group_symbols(&config, &group, max_symbols)
                .await
                .context("종목 조회 실패")?;
            for symbol in &symbols {
                println!("{}", symbol);
            }
            tracing::info!(group = %group, count = symbols.len(), "종목 출력 완료");
            !symbols.is_empty()
        }
        Commands::Daemon(args) => {
            args.apply(&mut config);
            run_daemon(&config, &args).await;
            true
        }
        Commands::Validate(target) => {
            target.apply(&mut config);
            validate(&config, &target.request()).await?
        }
    };

    tracing::info!("vnstock Data Collector 종료");
    Ok(ok)
}

fn report(stats: &CollectionStats) -> bool {
    stats.log_summary("일별 시세 수집");
    if !stats.is_success() {
        tracing::error!(
            total = stats.total,
            errors = stats.errors,
            "수집 또는 저장에 성공한 심볼이 없습니다"
        );
    }
    stats.is_success()
}

/// 저장 데이터 검증. 중복이나 조회 실패가 없으면 `true`.
async fn validate(config: &CollectorConfig, request: &CollectRequest) -> anyhow::Result<bool> {
    let reports = modules::validate_stored(config, request)
        .await
        .context("저장 데이터 검증 실패")?;

    for report in &reports {
        println!(
            "{}\t{}\ttotal={}\tunique={}\tduplicates={}",
            report.symbol,
            report.status.as_str(),
            report.total_records,
            report.unique_dates,
            report.duplicate_records
        );
    }

    let summary = ValidationSummary::from_reports(&reports);
    summary.log_summary();
    if !summary.is_clean() {
        tracing::error!(
            has_duplicates = summary.has_duplicates,
            errors = summary.errors,
            "저장 데이터 검증 실패"
        );
    }
    Ok(summary.is_clean())
}

async fn run_daemon(config: &CollectorConfig, args: &CollectArgs) {
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        config.daemon.interval_minutes
    );

    let mut interval = tokio::time::interval(config.daemon.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut total = CollectionStats::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = interval.tick() => {
                tracing::info!("=== 수집 실행 시작 ===");

                match modules::collect_ohlcv(config, args.request()).await {
                    Ok(stats) => {
                        report(&stats);
                        total.merge(&stats);
                    }
                    Err(e) => {
                        tracing::error!("일별 시세 수집 실패: {}", e);
                    }
                }

                tracing::info!(
                    "=== 수집 완료, 다음 실행: {}분 후 ===",
                    config.daemon.interval_minutes
                );
            }
        }
    }

    total.log_summary("데몬 누적");
}
