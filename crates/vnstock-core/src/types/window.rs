//! 수집 기간 타입.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// 한 심볼에 대해 요청할 날짜 범위 (양 끝 포함).
///
/// 항상 `start <= end`를 만족합니다. [`FetchWindow::new`]로만 생성할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl FetchWindow {
    /// 새 수집 기간 생성. `start > end`이면 `None`.
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            symbol: symbol.into(),
            start,
            end,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 날짜가 기간 안에 있는지 확인
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// 기간에 포함된 일수 (양 끝 포함)
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} ~ {}]", self.symbol, self.start, self.end)
    }
}

/// 기간 계산 결과.
///
/// 새로 받을 데이터가 없으면 `NothingToDo`가 반환되며, 이 경우 네트워크 요청을
/// 하지 않고 성공한 no-op으로 처리해야 합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// 이 기간을 수집
    Fetch(FetchWindow),
    /// 받을 데이터 없음 (계산된 start가 end보다 늦음)
    NothingToDo {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl FetchPlan {
    /// 계산된 시작/종료일로부터 계획 생성
    pub fn from_range(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        let symbol = symbol.into();
        match FetchWindow::new(symbol.clone(), start, end) {
            Some(window) => Self::Fetch(window),
            None => Self::NothingToDo { symbol, start, end },
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::Fetch(window) => window.symbol(),
            Self::NothingToDo { symbol, .. } => symbol,
        }
    }

    pub fn window(&self) -> Option<&FetchWindow> {
        match self {
            Self::Fetch(window) => Some(window),
            Self::NothingToDo { .. } => None,
        }
    }

    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, Self::NothingToDo { .. })
    }
}
