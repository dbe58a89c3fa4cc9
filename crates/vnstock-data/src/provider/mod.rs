//! 원격 데이터 소스.
//!
//! - [`SsiClient`]: SSI iBoard HTTP 클라이언트
//! - [`StockInfoSource`]: 페이지 단위 stock-info 엔드포인트
//! - [`ChartHistorySource`]: 컬럼형 charts history 엔드포인트
//! - [`StaticPagedSource`]: 미리 준비한 페이지를 반환하는 소스 (테스트용)

pub mod charts;
pub mod mock;
pub mod ssi;
pub mod traits;

pub use charts::{chart_rows, window_timestamps};
pub use mock::StaticPagedSource;
pub use ssi::{
    format_ssi_date, is_daily_resolution, parse_group_symbols, ChartHistorySource, SsiClient,
    SsiConfig, StockInfoSource,
};
pub use traits::{PageRequest, PagedSource};
