//! SSI iBoard API 클라이언트.
//!
//! 공개 iBoard 엔드포인트에서 베트남 주식 데이터를 조회합니다.
//!
//! ## 엔드포인트
//! - `statistics/company/ssmi/stock-info`: 일별 통계 (페이지, `DD/MM/YYYY`)
//! - `statistics/charts/history`: OHLCV 컬럼 배열 (Unix 초)
//! - `stock/group/{GROUP}`: 지수 구성 종목 (예: VN100)
//!
//! ## 사용 예시
//! ```rust,ignore
//! let client = SsiClient::new(SsiConfig::default())?;
//! let symbols = client.fetch_group_symbols("VN100").await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::charts::{chart_rows, window_timestamps};
use super::traits::{PageRequest, PagedSource};
use crate::normalize::extract_items;
use crate::window::MARKET_TZ;
use crate::{DataError, Result};

pub const STOCK_INFO_URL: &str =
    "https://iboard-api.ssi.com.vn/statistics/company/ssmi/stock-info";
pub const CHARTS_HISTORY_URL: &str = "https://iboard-api.ssi.com.vn/statistics/charts/history";
pub const GROUP_URL: &str = "https://iboard-query.ssi.com.vn/stock/group";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// SSI 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct SsiConfig {
    pub stock_info_url: String,
    pub charts_url: String,
    /// 그룹 코드가 경로 끝에 붙습니다
    pub group_url: String,
    /// 요청당 타임아웃
    pub timeout: Duration,
}

impl Default for SsiConfig {
    fn default() -> Self {
        Self {
            stock_info_url: STOCK_INFO_URL.to_string(),
            charts_url: CHARTS_HISTORY_URL.to_string(),
            group_url: GROUP_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// SSI iBoard HTTP 클라이언트.
#[derive(Clone)]
pub struct SsiClient {
    client: Client,
    config: SsiConfig,
}

impl SsiClient {
    /// 브라우저와 같은 헤더로 클라이언트 생성
    pub fn new(config: SsiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://iboard.ssi.com.vn/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://iboard.ssi.com.vn"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SsiConfig {
        &self.config
    }

    /// stock-info 한 페이지 조회 (원본 JSON)
    pub async fn fetch_stock_info_page(&self, request: &PageRequest) -> Result<Value> {
        let query = [
            ("symbol", request.symbol.clone()),
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("fromDate", format_ssi_date(request.start)),
            ("toDate", format_ssi_date(request.end)),
        ];
        self.get_json(&self.config.stock_info_url, &query).await
    }

    /// charts history 조회 (원본 JSON, 컬럼 배열)
    pub async fn fetch_chart_history(
        &self,
        symbol: &str,
        resolution: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Value> {
        let (from, to) = window_timestamps(start, end, MARKET_TZ);
        let query = [
            ("resolution", resolution.to_string()),
            ("symbol", symbol.to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        self.get_json(&self.config.charts_url, &query).await
    }

    /// 그룹(지수) 구성 종목 조회
    pub async fn fetch_group_symbols(&self, group: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}", self.config.group_url.trim_end_matches('/'), group);
        let payload = self.get_json(&url, &[]).await?;
        let symbols = parse_group_symbols(&payload)?;
        debug!(group = group, count = symbols.len(), "그룹 종목 조회 완료");
        Ok(symbols)
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// SSI 날짜 파라미터 형식 (`DD/MM/YYYY`)
pub fn format_ssi_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// 그룹 응답에서 종목 코드 추출 (`stock_symbol` 또는 `stockSymbol`).
pub fn parse_group_symbols(payload: &Value) -> Result<Vec<String>> {
    let items = extract_items(payload)
        .ok_or_else(|| DataError::Shape("그룹 응답에 종목 배열이 없습니다".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            item.get("stock_symbol")
                .or_else(|| item.get("stockSymbol"))
                .and_then(Value::as_str)
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// stock-info 페이지 소스.
#[derive(Clone)]
pub struct StockInfoSource {
    client: SsiClient,
}

impl StockInfoSource {
    pub fn new(client: SsiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PagedSource for StockInfoSource {
    fn name(&self) -> &str {
        "ssi-stock-info"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        self.client.fetch_stock_info_page(request).await
    }
}

/// 일/주/월 해상도인지 확인.
///
/// 레코드는 거래일로 키를 잡으므로 하루에 바가 여러 개인 분/시간 해상도는 받을 수 없습니다.
pub fn is_daily_resolution(resolution: &str) -> bool {
    matches!(
        resolution.trim(),
        "D" | "1D" | "d" | "1d" | "W" | "1W" | "w" | "1w" | "M" | "1M"
    )
}

/// charts history 소스.
///
/// 페이지 개념이 없어 1페이지에 전체 기간을 반환하고, 이후 페이지는 빈 배열입니다.
#[derive(Clone)]
pub struct ChartHistorySource {
    client: SsiClient,
    resolution: String,
    tz: Tz,
}

impl ChartHistorySource {
    /// 일/주/월 해상도만 허용 (분/시간 해상도는 `DataError::Config`)
    pub fn new(client: SsiClient, resolution: impl Into<String>) -> Result<Self> {
        let resolution = resolution.into().trim().to_string();
        if !is_daily_resolution(&resolution) {
            return Err(DataError::Config(format!(
                "charts 해상도는 일/주/월 단위만 지원합니다 (1d, 1w, 1M): {}",
                resolution
            )));
        }

        Ok(Self {
            client,
            resolution,
            tz: MARKET_TZ,
        })
    }

    pub fn resolution(&self) -> &str {
        &self.resolution
    }
}

#[async_trait]
impl PagedSource for ChartHistorySource {
    fn name(&self) -> &str {
        "ssi-charts-history"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        if request.page > 1 {
            return Ok(Value::Array(Vec::new()));
        }

        let payload = self
            .client
            .fetch_chart_history(&request.symbol, &self.resolution, request.start, request.end)
            .await?;
        let rows = chart_rows(&payload, self.tz)?;
        Ok(Value::Array(rows))
    }
}
