//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 수집/저장 오류.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Transport(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 2xx가 아닌 HTTP 응답
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 예상하지 못한 JSON 구조
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// 저장소가 레코드를 거부함 (재시도 금지)
    #[error("Validation rejected: {0}")]
    Validation(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    /// 재시도 가능한 일시적 오류인지 확인.
    ///
    /// 5xx와 429만 재시도하며, 그 외 4xx와 검증 오류는 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Transport(_) | DataError::Timeout(_) => true,
            DataError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// 전송 계층 오류(네트워크, 타임아웃, 비정상 상태 코드)인지 확인.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DataError::Transport(_) | DataError::Timeout(_) | DataError::HttpStatus { .. }
        )
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            DataError::HttpStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else {
            DataError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
