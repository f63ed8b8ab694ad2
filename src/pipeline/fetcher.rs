//! Bounded pool of remote fetches shared by both lanes

use crate::api::SearchApi;
use crate::error::SearchError;
use crate::types::{PageRequest, SearchResult};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn SearchApi>,
    permits: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(api: Arc<dyn SearchApi>, workers: usize) -> Self {
        Self {
            api,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Run one remote call once a worker slot is free.
    pub async fn fetch(&self, request: &PageRequest) -> Result<SearchResult, SearchError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SearchError::Transport("fetch pool closed".to_string()))?;
        self.api.search(request).await
    }
}
