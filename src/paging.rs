//! Pull-based paging on top of the pipeline
//!
//! A display layer asks a `PagedSource` for "the page after N"; the source
//! turns that into a continuation request and hands back the loaded items
//! and the key of the following page. Every admitted query gets a fresh
//! source from the `SourceFactory`, which invalidates its predecessor.

use crate::pipeline::continuation_lane::PageQueue;
use crate::types::{LoadCallback, LoadResult, PageLoad, PageRequest, Query};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct SourceState {
    initial_loaded: bool,
    /// A load of this source is queued or in flight
    loading: bool,
    next_key: Option<u32>,
    loaded_items: usize,
}

struct SourceInner {
    query: Query,
    page_size: u32,
    pages: PageQueue,
    lease: CancellationToken,
    state: Mutex<SourceState>,
}

/// Paging view of one admitted query.
#[derive(Clone)]
pub struct PagedSource {
    inner: Arc<SourceInner>,
}

impl PagedSource {
    pub(crate) fn new(query: Query, page_size: u32, pages: PageQueue) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                query,
                page_size,
                pages,
                lease: CancellationToken::new(),
                state: Mutex::new(SourceState {
                    loading: true,
                    ..SourceState::default()
                }),
            }),
        }
    }

    pub fn query(&self) -> &Query {
        &self.inner.query
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completion for the initial page, recording the first next key.
    pub(crate) fn initial_callback(&self) -> LoadCallback {
        let source = self.clone();
        Box::new(move |result: LoadResult| {
            let mut state = source.state();
            state.loading = false;
            if let Ok(load) = &result {
                state.initial_loaded = true;
                state.next_key = load.next_key;
                state.loaded_items = load.items.len();
            }
        })
    }

    /// Request the page numbered `key`. Returns false when the source is
    /// invalidated, its initial page has not arrived yet or the continuation
    /// buffer is full; the callback is then dropped without being invoked.
    pub fn load_after(&self, key: u32, requested_size: u32, callback: LoadCallback) -> bool {
        if self.is_invalid() {
            log::debug!("Ignoring load of page {} on invalidated source", key);
            return false;
        }

        {
            // Pages appended before the initial reset would be wiped by it
            let mut state = self.state();
            if !state.initial_loaded {
                log::debug!(
                    "Ignoring load of page {} before the initial page of '{}'",
                    key,
                    self.inner.query
                );
                return false;
            }
            state.loading = true;
        }
        let source = self.clone();
        let tracked: LoadCallback = Box::new(move |result: LoadResult| {
            {
                let mut state = source.state();
                state.loading = false;
                if let Ok(load) = &result {
                    state.next_key = load.next_key;
                    state.loaded_items += load.items.len();
                }
            }
            callback(result);
        });

        let request = PageRequest::continuation(self.inner.query.clone(), requested_size, key);
        let enqueued = self
            .inner
            .pages
            .try_enqueue(request, self.inner.lease.clone(), tracked);
        if !enqueued {
            self.state().loading = false;
        }
        enqueued
    }

    /// Results only ever grow forward.
    pub fn load_before(&self, _key: u32, _requested_size: u32) -> PageLoad {
        PageLoad::empty()
    }

    /// Load the page following everything loaded so far, if there is one.
    pub fn load_next(&self) -> bool {
        let key = {
            let state = self.state();
            if state.loading || !state.initial_loaded {
                return false;
            }
            match state.next_key {
                Some(key) => key,
                None => return false,
            }
        };
        self.load_after(key, self.inner.page_size, Box::new(|_| {}))
    }

    /// Whether showing the item at `position` should pull in the next page.
    pub fn should_prefetch(&self, position: usize, prefetch_distance: usize) -> bool {
        if self.is_invalid() {
            return false;
        }
        let state = self.state();
        state.initial_loaded
            && !state.loading
            && state.next_key.is_some()
            && position.saturating_add(prefetch_distance) >= state.loaded_items
    }

    pub fn next_key(&self) -> Option<u32> {
        self.state().next_key
    }

    pub fn loaded_items(&self) -> usize {
        self.state().loaded_items
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn invalidate(&self) {
        self.inner.lease.cancel();
    }

    pub fn is_invalid(&self) -> bool {
        self.inner.lease.is_cancelled()
    }
}

impl std::fmt::Debug for PagedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedSource")
            .field("query", &self.inner.query)
            .field("invalid", &self.is_invalid())
            .field("state", &*self.state())
            .finish()
    }
}

/// Creates one `PagedSource` per admitted query and keeps track of the
/// active one.
pub struct SourceFactory {
    pages: PageQueue,
    page_size: u32,
    current: Mutex<Option<PagedSource>>,
}

impl SourceFactory {
    pub(crate) fn new(pages: PageQueue, page_size: u32) -> Self {
        Self {
            pages,
            page_size,
            current: Mutex::new(None),
        }
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<PagedSource>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate the active source and install a fresh one for `query`.
    pub fn create(&self, query: Query) -> PagedSource {
        let source = PagedSource::new(query, self.page_size, self.pages.clone());
        if let Some(previous) = self.current_slot().replace(source.clone()) {
            log::debug!("Invalidating paging source for '{}'", previous.query());
            previous.invalidate();
        }
        source
    }

    pub fn current(&self) -> Option<PagedSource> {
        self.current_slot().clone()
    }

    pub fn invalidate_current(&self) {
        if let Some(previous) = self.current_slot().take() {
            previous.invalidate();
        }
    }
}
