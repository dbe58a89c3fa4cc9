//! # VnStock Core
//!
//! 베트남 주식 데이터 수집기의 핵심 도메인 타입을 제공합니다.
//!
//! - 수집 기간 (`FetchWindow`, `FetchPlan`)
//! - 일별 시세 레코드 (`DailyRecord`)
//! - 페이지 수집 결과 (`FetchResult`, `CompletionReason`)
//! - 로깅 인프라

pub mod logging;
pub mod types;

pub use logging::*;
pub use types::*;
