//! テスト用の共通ヘルパー
//!
//! `ScriptedApi` answers from a table keyed by (query, page) and records
//! every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use pagesearch::{
    Item, LoadCallback, LoadResult, PageRequest, RequestKind, SearchApi, SearchConfig,
    SearchError, SearchResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<SearchResult, SearchError>,
}

#[derive(Default)]
pub struct ScriptedApi {
    calls: Mutex<Vec<PageRequest>>,
    script: Mutex<HashMap<(String, u32), Scripted>>,
    continuations_in_flight: AtomicUsize,
    max_continuations_in_flight: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, query: &str, page: u32, result: Result<SearchResult, SearchError>) {
        self.respond_after(query, page, Duration::ZERO, result);
    }

    pub fn respond_after(
        &self,
        query: &str,
        page: u32,
        delay: Duration,
        result: Result<SearchResult, SearchError>,
    ) {
        self.script
            .lock()
            .unwrap()
            .insert((query.to_string(), page), Scripted { delay, result });
    }

    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Page numbers of the continuation calls, in call order.
    pub fn continuation_pages(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|r| r.kind == RequestKind::Continuation)
            .map(|r| r.page_number)
            .collect()
    }

    pub fn max_continuations_in_flight(&self) -> usize {
        self.max_continuations_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    async fn search(&self, request: &PageRequest) -> Result<SearchResult, SearchError> {
        self.calls.lock().unwrap().push(request.clone());

        let scripted = self
            .script
            .lock()
            .unwrap()
            .get(&(request.query.as_str().to_string(), request.page_number))
            .cloned()
            .unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: Ok(page(request.query.as_str(), request.page_number, 2, None)),
            });

        let continuation = request.kind == RequestKind::Continuation;
        if continuation {
            let now = self.continuations_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_continuations_in_flight.fetch_max(now, Ordering::SeqCst);
        }

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        if continuation {
            self.continuations_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        scripted.result
    }
}

/// `count` items whose ids encode the page: `page * 1000 + i`.
pub fn page(query: &str, page: u32, count: u64, last_page: Option<u32>) -> SearchResult {
    SearchResult {
        items: (0..count)
            .map(|i| Item::new(page as u64 * 1000 + i, format!("{}-{}-{}", query, page, i)))
            .collect(),
        total_count: 1000,
        last_page,
    }
}

pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn config() -> SearchConfig {
    SearchConfig::default()
}

/// Let debounce windows and scripted delays run out (paused clock).
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}

pub fn recording_callback() -> (LoadCallback, Arc<Mutex<Vec<LoadResult>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    (Box::new(move |result| sink.lock().unwrap().push(result)), calls)
}

pub fn pages_of(items: &[Item]) -> Vec<u64> {
    let mut pages: Vec<u64> = items.iter().map(|item| item.id / 1000).collect();
    pages.dedup();
    pages
}
