//! 환경변수 기반 설정 모듈.

use chrono::NaiveDate;
use std::time::Duration;
use vnstock_data::{ResolverConfig, RetrieverConfig, RetryPolicy, SsiConfig};

use crate::error::CollectorError;
use crate::Result;

/// 기본 영속화 API 주소
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 영속화 API 주소 (`/stock-statistics`, `/stock-prices`)
    pub api_url: String,
    /// SSI 엔드포인트 설정
    pub ssi: SsiSettings,
    /// 페이지 수집 설정
    pub fetch: FetchSettings,
    /// 수집 기간 설정
    pub window: WindowSettings,
    /// 업서트 재시도 설정
    pub retry: RetrySettings,
    /// 수집 대상 설정
    pub symbols: SymbolSettings,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// SSI 엔드포인트 설정
#[derive(Debug, Clone)]
pub struct SsiSettings {
    pub stock_info_url: String,
    pub charts_url: String,
    pub group_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 수집 데이터 소스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SourceKind {
    /// 페이지 단위 일별 통계 (확장 필드 포함)
    #[default]
    StockInfo,
    /// 컬럼형 OHLCV 차트 이력
    Charts,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stock-info" | "stock_info" => Ok(Self::StockInfo),
            "charts" | "chart" => Ok(Self::Charts),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

/// 페이지 수집 설정
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub source: SourceKind,
    /// 페이지당 항목 수
    pub page_size: u32,
    /// 안전 정지 페이지 수
    pub max_pages: u32,
    /// 페이지 간 딜레이 (밀리초)
    pub page_delay_ms: u64,
    /// 심볼 간 딜레이 (밀리초)
    pub symbol_delay_ms: u64,
    /// charts 해상도 (예: "1d")
    pub resolution: String,
}

/// 수집 기간 설정
#[derive(Debug, Clone)]
pub struct WindowSettings {
    /// 저장 데이터가 없을 때의 시작일
    pub epoch: NaiveDate,
    /// 저장 데이터가 없을 때 거슬러 올라갈 일수
    pub days_back: Option<i64>,
    /// 당일 세션 정산 기준 시각 (현지)
    pub cutoff_hour: u32,
}

/// 업서트 재시도 설정
#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// 저장 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 수집 대상 설정
#[derive(Debug, Clone)]
pub struct SymbolSettings {
    /// 종목 그룹 (예: VN100)
    pub group: String,
    /// 최대 수집 종목 수
    pub max_symbols: Option<usize>,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        let retriever = RetrieverConfig::default();
        let resolver = ResolverConfig::default();
        let retry = RetryPolicy::default();

        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ssi: SsiSettings::from(SsiConfig::default()),
            fetch: FetchSettings {
                source: SourceKind::StockInfo,
                page_size: retriever.page_size,
                max_pages: retriever.max_pages,
                page_delay_ms: retriever.page_delay.as_millis() as u64,
                symbol_delay_ms: 1000,
                resolution: "1d".to_string(),
            },
            window: WindowSettings {
                epoch: resolver.epoch,
                days_back: resolver.days_back,
                cutoff_hour: resolver.cutoff_hour,
            },
            retry: RetrySettings {
                max_attempts: retry.max_attempts,
                base_delay_ms: retry.base_delay.as_millis() as u64,
                max_delay_ms: retry.max_delay.as_millis() as u64,
                timeout_secs: 30,
            },
            symbols: SymbolSettings {
                group: "VN100".to_string(),
                max_symbols: None,
            },
            daemon: DaemonConfig {
                interval_minutes: 60,
            },
        }
    }
}

impl From<SsiConfig> for SsiSettings {
    fn from(config: SsiConfig) -> Self {
        Self {
            stock_info_url: config.stock_info_url,
            charts_url: config.charts_url,
            group_url: config.group_url,
            timeout_secs: config.timeout.as_secs(),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let epoch = match std::env::var("WINDOW_EPOCH") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                CollectorError::Config(format!("WINDOW_EPOCH 형식 오류 ({}): {}", raw, e))
            })?,
            Err(_) => defaults.window.epoch,
        };

        let cutoff_hour: u32 = env_var_parse("WINDOW_CUTOFF_HOUR", defaults.window.cutoff_hour);
        if cutoff_hour > 23 {
            return Err(CollectorError::Config(format!(
                "WINDOW_CUTOFF_HOUR는 0~23 사이여야 합니다: {}",
                cutoff_hour
            )));
        }

        Ok(Self {
            api_url: std::env::var("VNSTOCK_API_URL").unwrap_or(defaults.api_url),
            ssi: SsiSettings {
                stock_info_url: std::env::var("SSI_STOCK_INFO_URL")
                    .unwrap_or(defaults.ssi.stock_info_url),
                charts_url: std::env::var("SSI_CHARTS_URL").unwrap_or(defaults.ssi.charts_url),
                group_url: std::env::var("SSI_GROUP_URL").unwrap_or(defaults.ssi.group_url),
                timeout_secs: env_var_parse("SSI_TIMEOUT_SECS", defaults.ssi.timeout_secs),
            },
            fetch: FetchSettings {
                source: env_var_parse("FETCH_SOURCE", defaults.fetch.source),
                page_size: env_var_parse("FETCH_PAGE_SIZE", defaults.fetch.page_size),
                max_pages: env_var_parse("FETCH_MAX_PAGES", defaults.fetch.max_pages),
                page_delay_ms: env_var_parse("FETCH_PAGE_DELAY_MS", defaults.fetch.page_delay_ms),
                symbol_delay_ms: env_var_parse(
                    "FETCH_SYMBOL_DELAY_MS",
                    defaults.fetch.symbol_delay_ms,
                ),
                resolution: std::env::var("FETCH_RESOLUTION").unwrap_or(defaults.fetch.resolution),
            },
            window: WindowSettings {
                epoch,
                days_back: env_var_opt("WINDOW_DAYS_BACK"),
                cutoff_hour,
            },
            retry: RetrySettings {
                max_attempts: env_var_parse("RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
                base_delay_ms: env_var_parse("RETRY_BASE_DELAY_MS", defaults.retry.base_delay_ms),
                max_delay_ms: env_var_parse("RETRY_MAX_DELAY_MS", defaults.retry.max_delay_ms),
                timeout_secs: env_var_parse("API_TIMEOUT_SECS", defaults.retry.timeout_secs),
            },
            symbols: SymbolSettings {
                group: std::env::var("SYMBOL_GROUP").unwrap_or(defaults.symbols.group),
                max_symbols: env_var_opt("SYMBOL_MAX"),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse(
                    "DAEMON_INTERVAL_MINUTES",
                    defaults.daemon.interval_minutes,
                ),
            },
        })
    }

    /// SSI 클라이언트 설정
    pub fn ssi_config(&self) -> SsiConfig {
        SsiConfig {
            stock_info_url: self.ssi.stock_info_url.clone(),
            charts_url: self.ssi.charts_url.clone(),
            group_url: self.ssi.group_url.clone(),
            timeout: Duration::from_secs(self.ssi.timeout_secs),
        }
    }

    /// 페이지 수집기 설정
    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig::default()
            .with_page_size(self.fetch.page_size)
            .with_max_pages(self.fetch.max_pages)
            .with_page_delay(Duration::from_millis(self.fetch.page_delay_ms))
    }

    /// 기간 계산 설정
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            epoch: self.window.epoch,
            days_back: self.window.days_back,
            cutoff_hour: self.window.cutoff_hour,
        }
    }

    /// 재시도 정책
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }
}

impl FetchSettings {
    /// 심볼 간 딜레이를 Duration으로 반환
    pub fn symbol_delay(&self) -> Duration {
        Duration::from_millis(self.symbol_delay_ms)
    }
}

impl RetrySettings {
    /// 저장 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_var_opt(key).unwrap_or(default)
}

/// 환경변수에서 선택 값 파싱 (없거나 파싱 실패 시 `None`)
fn env_var_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
