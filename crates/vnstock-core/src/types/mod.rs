//! 수집 파이프라인 공용 타입.

pub mod fetch_result;
pub mod record;
pub mod window;

pub use fetch_result::{CompletionReason, FetchResult};
pub use record::DailyRecord;
pub use window::{FetchPlan, FetchWindow};
