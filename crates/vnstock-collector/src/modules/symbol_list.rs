//! 수집 대상 종목 결정.

use vnstock_data::SsiClient;

use crate::error::CollectorError;
use crate::{CollectorConfig, Result};

/// 쉼표로 구분된 종목 목록 파싱.
///
/// 공백을 제거하고 대문자로 맞추며, 중복은 처음 등장한 순서로 하나만 남깁니다.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = symbol.to_uppercase();
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

/// 수집 대상 종목 결정.
///
/// 명시한 종목이 있으면 그대로 사용하고, 없으면 그룹 구성 종목을 조회합니다.
pub async fn resolve_symbols(
    client: &SsiClient,
    explicit: Option<&str>,
    group: &str,
    max_symbols: Option<usize>,
) -> Result<Vec<String>> {
    let mut symbols = match explicit {
        Some(raw) => {
            let symbols = parse_symbol_list(raw);
            tracing::info!(count = symbols.len(), "특정 심볼 수집");
            symbols
        }
        None => {
            let symbols = client.fetch_group_symbols(group).await.map_err(|e| {
                CollectorError::DataSource(format!("{} 그룹 종목 조회 실패: {}", group, e))
            })?;
            tracing::info!(group = group, count = symbols.len(), "그룹 종목 조회 완료");
            symbols
        }
    };

    if let Some(max) = max_symbols {
        if symbols.len() > max {
            tracing::info!(max_symbols = max, available = symbols.len(), "종목 수 제한 적용");
            symbols.truncate(max);
        }
    }

    Ok(symbols)
}

/// 그룹 구성 종목 조회 (`symbols` 명령)
pub async fn list_group_symbols(
    config: &CollectorConfig,
    group: &str,
    max_symbols: Option<usize>,
) -> Result<Vec<String>> {
    let client = SsiClient::new(config.ssi_config())?;
    resolve_symbols(&client, None, group, max_symbols).await
}
