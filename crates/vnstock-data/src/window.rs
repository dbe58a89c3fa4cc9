//! 증분 수집 기간 계산.
//!
//! 저장소의 마지막 거래일 다음 날부터 정산된 마지막 거래일까지를 수집 기간으로
//! 잡습니다. 장 마감 정산 전(기본 17시 이전)에는 오늘을 제외합니다.

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};
use vnstock_core::FetchPlan;

use crate::store::RecordStore;

/// 시장 시간대 (호찌민)
pub const MARKET_TZ: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// 시장 시간대 기준 현재 시각
pub fn market_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&MARKET_TZ)
}

/// 기간 계산 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// 저장된 데이터가 없을 때의 시작일
    pub epoch: NaiveDate,
    /// 저장된 데이터가 없을 때 end로부터 거슬러 올라갈 일수 (epoch보다 우선)
    pub days_back: Option<i64>,
    /// 이 시각(현지) 이전이면 오늘 세션은 미정산으로 간주
    pub cutoff_hour: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN),
            days_back: None,
            cutoff_hour: 17,
        }
    }
}

/// 사용자가 지정한 시작/종료일.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateOverride {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateOverride {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// 시작/종료일이 모두 지정되었는지
    pub fn is_full(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// 증분 수집 기간 계산기.
#[derive(Debug, Clone, Default)]
pub struct WindowResolver {
    config: ResolverConfig,
}

impl WindowResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// 정산이 끝난 마지막 날짜.
    ///
    /// 현지 시각이 cutoff 이전이면 어제, 이후면 오늘.
    pub fn settled_end(&self, now: DateTime<Tz>) -> NaiveDate {
        let today = now.date_naive();
        if now.hour() < self.config.cutoff_hour {
            today.pred_opt().unwrap_or(today)
        } else {
            today
        }
    }

    /// 수집 계획 계산.
    ///
    /// 지정된 날짜가 계산값보다 우선합니다. 계산된 start가 end보다 늦으면
    /// [`FetchPlan::NothingToDo`]를 반환합니다.
    pub fn resolve(
        &self,
        symbol: &str,
        latest: Option<NaiveDate>,
        overrides: DateOverride,
        now: DateTime<Tz>,
    ) -> FetchPlan {
        let end = overrides.end.unwrap_or_else(|| self.settled_end(now));
        let start = overrides.start.unwrap_or_else(|| self.default_start(latest, end));

        let plan = FetchPlan::from_range(symbol, start, end);
        if plan.is_nothing_to_do() {
            debug!(symbol = symbol, %start, %end, "새로 받을 데이터 없음");
        }
        plan
    }

    /// 저장소의 마지막 거래일을 조회해 수집 계획 계산.
    ///
    /// 시작일이 지정되면 저장소를 조회하지 않습니다. 조회 실패는 저장된 데이터가
    /// 없는 것으로 처리합니다.
    pub async fn resolve_incremental<R>(
        &self,
        store: &R,
        symbol: &str,
        overrides: DateOverride,
        now: DateTime<Tz>,
    ) -> FetchPlan
    where
        R: RecordStore + ?Sized,
    {
        if overrides.start.is_some() {
            return self.resolve(symbol, None, overrides, now);
        }

        let latest = match store.latest_stored_date(symbol).await {
            Ok(latest) => latest,
            Err(e) => {
                warn!(symbol = symbol, error = %e, "마지막 저장일 조회 실패, 전체 기간으로 진행");
                None
            }
        };

        self.resolve(symbol, latest, overrides, now)
    }

    fn default_start(&self, latest: Option<NaiveDate>, end: NaiveDate) -> NaiveDate {
        if let Some(latest) = latest {
            return latest + Days::new(1);
        }
        match self.config.days_back {
            Some(days) if days >= 0 => end
                .checked_sub_days(Days::new(days as u64))
                .unwrap_or(self.config.epoch),
            _ => self.config.epoch,
        }
    }
}
