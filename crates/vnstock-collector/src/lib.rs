//! SSI 일별 통계 증분 수집기.
//!
//! 이 crate는 수집 바이너리와 그 구성 요소를 제공합니다:
//! - 환경변수 기반 설정
//! - 심볼 단위 수집 루프 (기간 계산 → 페이지 수집 → 업서트)
//! - 실행 통계 집계

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, SourceKind};
pub use error::{CollectorError, Result};
pub use stats::{CollectionStats, SymbolOutcome, SymbolReport};
