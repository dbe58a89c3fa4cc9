//! 데이터 수집 모듈.

pub mod ohlcv_collect;
pub mod symbol_list;
pub mod validate;

pub use ohlcv_collect::{collect_ohlcv, CollectRequest, Collector, DryRunStore};
pub use symbol_list::{list_group_symbols, parse_symbol_list, resolve_symbols};
pub use validate::{
    validate_stored, validate_symbol, validate_symbols, ValidationReport, ValidationStatus,
    ValidationSummary,
};
