//! 페이지 수집 결과.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DailyRecord;

/// 페이지 수집 종료 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionReason {
    /// 빈 페이지 수신
    Exhausted,
    /// 페이지 크기보다 적은 항목 수신 (마지막 페이지)
    PageSizeFloor,
    /// 응답의 total 값에 도달
    TotalReached,
    /// 최대 페이지 수 도달 (안전 정지)
    MaxPagesSafetyStop,
    /// 네트워크/HTTP 오류로 중단
    NetworkError,
    /// 받을 데이터 없음 (요청하지 않음)
    NothingToDo,
}

impl CompletionReason {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::PageSizeFloor => "page-size-floor",
            Self::TotalReached => "total-reached",
            Self::MaxPagesSafetyStop => "max-pages-safety-stop",
            Self::NetworkError => "network-error",
            Self::NothingToDo => "nothing-to-do",
        }
    }

    /// 데이터를 끝까지 받았는지 (안전 정지/네트워크 오류가 아닌 경우)
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::Exhausted | Self::PageSizeFloor | Self::TotalReached | Self::NothingToDo
        )
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 심볼의 페이지 수집 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    /// 종목 코드
    pub symbol: String,
    /// 날짜 오름차순, 날짜당 1건
    pub records: Vec<DailyRecord>,
    /// 처리한 페이지 수
    pub pages: usize,
    /// 발생한 오류 수 (네트워크, 응답 형식)
    pub errors: usize,
    /// 종료 사유
    pub reason: CompletionReason,
    /// 마지막 오류 메시지
    pub error: Option<String>,
}

impl FetchResult {
    /// 요청 없이 끝난 결과
    pub fn nothing_to_do(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            records: Vec::new(),
            pages: 0,
            errors: 0,
            reason: CompletionReason::NothingToDo,
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
