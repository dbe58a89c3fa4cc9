//! 페이지 단위 데이터 소스 trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use crate::Result;

/// 페이지 요청 파라미터.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 1부터 시작
    pub page: u32,
    pub page_size: u32,
}

/// 페이지 단위로 원본 JSON을 돌려주는 원격 엔드포인트.
///
/// 응답 구조 해석과 필드 정규화는 수집기가 담당하므로, 구현체는 요청 파라미터를
/// 엔드포인트 형식에 맞게 변환하고 본문을 그대로 반환하면 됩니다.
#[async_trait]
pub trait PagedSource: Send + Sync {
    /// 소스 이름 (로그용)
    fn name(&self) -> &str;

    /// 한 페이지 조회.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value>;
}

#[async_trait]
impl<S: PagedSource + ?Sized> PagedSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        (**self).fetch_page(request).await
    }
}

#[async_trait]
impl<S: PagedSource + ?Sized> PagedSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        (**self).fetch_page(request).await
    }
}
