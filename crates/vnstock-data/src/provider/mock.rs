//! 미리 준비한 페이지를 반환하는 소스.
//!
//! 네트워크 없이 수집기를 구동하는 테스트에서 사용합니다.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::traits::{PageRequest, PagedSource};
use crate::{DataError, Result};

/// 페이지 번호 순서대로 응답을 돌려주는 소스.
///
/// 심볼별 페이지가 있으면 그것을, 없으면 공통 페이지를 사용합니다.
/// 준비한 페이지보다 뒤의 페이지는 빈 배열을 반환합니다.
pub struct StaticPagedSource {
    name: String,
    pages: Vec<Result<Value>>,
    by_symbol: HashMap<String, Vec<Result<Value>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<PageRequest>>,
}

impl StaticPagedSource {
    pub fn new(pages: Vec<Result<Value>>) -> Self {
        Self {
            name: "static".to_string(),
            pages,
            by_symbol: HashMap::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 모든 페이지가 성공 응답인 소스
    pub fn from_payloads(payloads: Vec<Value>) -> Self {
        Self::new(payloads.into_iter().map(Ok).collect())
    }

    /// 특정 심볼에만 적용할 페이지
    pub fn with_symbol_pages(
        mut self,
        symbol: impl Into<String>,
        pages: Vec<Result<Value>>,
    ) -> Self {
        self.by_symbol.insert(symbol.into(), pages);
        self
    }

    /// `fetch_page` 호출 횟수
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 받은 요청 목록 (호출 순서)
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PagedSource for StaticPagedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let index = request
            .page
            .checked_sub(1)
            .ok_or_else(|| DataError::Config("페이지 번호는 1부터 시작합니다".to_string()))?;

        let pages = self.by_symbol.get(&request.symbol).unwrap_or(&self.pages);
        match pages.get(index as usize) {
            Some(page) => page.clone(),
            None => Ok(Value::Array(Vec::new())),
        }
    }
}
