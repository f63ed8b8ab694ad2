//! Observable result state
//!
//! The state owner is the only writer. Readers get cheap snapshots through
//! `tokio::sync::watch` receivers and are woken on every change.

use crate::error::SearchError;
use crate::types::Item;
use std::sync::Arc;
use tokio::sync::watch;

pub type ResultList = Arc<Vec<Item>>;

/// Write side of the observable state.
#[derive(Debug)]
pub struct ResultSink {
    results: watch::Sender<ResultList>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<SearchError>>,
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink {
    pub fn new() -> Self {
        let (results, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);
        let (error, _) = watch::channel(None);
        Self {
            results,
            loading,
            error,
        }
    }

    pub fn observables(&self) -> Observables {
        Observables {
            results: self.results.subscribe(),
            loading: self.loading.subscribe(),
            error: self.error.subscribe(),
        }
    }

    /// Replace the whole list.
    pub fn reset(&self, items: Vec<Item>) {
        self.results.send_replace(Arc::new(items));
    }

    /// Append to the tail of the list.
    pub fn append(&self, items: Vec<Item>) {
        self.results.send_modify(|list| Arc::make_mut(list).extend(items));
    }

    pub fn len(&self) -> usize {
        self.results.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }

    pub fn set_error(&self, error: Option<SearchError>) {
        self.error.send_if_modified(|current| {
            if current.is_none() && error.is_none() {
                return false;
            }
            *current = error;
            true
        });
    }
}

/// Read side of the observable state, handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Observables {
    results: watch::Receiver<ResultList>,
    loading: watch::Receiver<bool>,
    error: watch::Receiver<Option<SearchError>>,
}

impl Observables {
    /// Full result list, updated on every reset or append.
    pub fn results(&self) -> watch::Receiver<ResultList> {
        self.results.clone()
    }

    /// True while any fetch is outstanding.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.clone()
    }

    /// Latest failure; cleared when a new query succeeds.
    pub fn errors(&self) -> watch::Receiver<Option<SearchError>> {
        self.error.clone()
    }

    pub fn snapshot(&self) -> ResultList {
        self.results.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn last_error(&self) -> Option<SearchError> {
        self.error.borrow().clone()
    }

    /// User-facing text of the latest failure.
    pub fn error_message(&self) -> Option<String> {
        self.error.borrow().as_ref().map(ToString::to_string)
    }
}
