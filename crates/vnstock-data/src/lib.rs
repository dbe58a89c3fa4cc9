//! SSI iBoard 데이터 수집.
//!
//! 이 crate는 다음을 제공합니다:
//! - SSI iBoard API 클라이언트 (stock-info, charts history, 종목 그룹)
//! - 응답 필드 정규화 (후보 키 테이블)
//! - 증분 수집 기간 계산
//! - 페이지 단위 수집기 (중복 제거, 종료 조건)
//! - 저장소 업서트 및 재시도

pub mod error;
pub mod normalize;
pub mod provider;
pub mod retriever;
pub mod store;
pub mod window;

pub use error::{DataError, Result};
pub use normalize::{FieldKind, FieldSpec, FieldTable};
pub use provider::{
    is_daily_resolution, ChartHistorySource, PageRequest, PagedSource, SsiClient, SsiConfig,
    StaticPagedSource, StockInfoSource,
};
pub use retriever::{PaginatedRetriever, RetrieverConfig};
pub use store::{
    deliver, upsert_with_retry, DeliveryStats, HttpRecordStore, MemoryRecordStore, RecordStore,
    RetryPolicy, StoreTable,
};
pub use window::{market_now, DateOverride, ResolverConfig, WindowResolver, MARKET_TZ};
