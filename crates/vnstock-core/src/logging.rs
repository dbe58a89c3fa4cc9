//! tracing 기반 로깅 설정.
//!
//! 수집기 바이너리에서 사용하는 출력 형식:
//! - **pretty**: 터미널에서 직접 실행할 때
//! - **json**: cron/데몬으로 돌리며 로그를 모을 때
//! - **compact**: 한 줄 요약

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT` 환경변수 (없거나 알 수 없으면 `None`)
    pub fn from_env() -> Option<Self> {
        std::env::var("LOG_FORMAT").ok()?.parse().ok()
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "vnstock_data=debug")
    pub filter: String,
    pub format: LogFormat,
}

impl LogConfig {
    /// 지정한 crate들에 같은 레벨을 적용
    pub fn for_crates(level: &str, crates: &[&str]) -> Self {
        let filter = crates
            .iter()
            .map(|name| format!("{}={}", name, level))
            .collect::<Vec<_>>()
            .join(",");

        Self {
            filter,
            format: LogFormat::default(),
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// 로깅 초기화.
///
/// `RUST_LOG`가 설정되어 있으면 `config.filter`보다 우선합니다.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init()?,
    }

    tracing::debug!(format = ?config.format, filter = %config.filter, "로깅 초기화");
    Ok(())
}

/// 심볼/소스 단위 수집 span
#[macro_export]
macro_rules! collect_span {
    ($symbol:expr, $source:expr) => {
        tracing::info_span!("collect", symbol = %$symbol, source = %$source)
    };
}
