//! Remote search API
//!
//! `SearchApi` is the single seam between the pipeline and the network: one
//! call per `(query, page_size, page_number)` and no retries.

use crate::error::SearchError;
use crate::types::{PageRequest, SearchResult};
use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
pub mod link_header;

pub use http::HttpSearchClient;
pub use link_header::{parse_last_page, ParseError};

#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Issue exactly one search request.
    async fn search(&self, request: &PageRequest) -> Result<SearchResult, SearchError>;
}

#[async_trait]
impl<T: SearchApi + ?Sized> SearchApi for Arc<T> {
    async fn search(&self, request: &PageRequest) -> Result<SearchResult, SearchError> {
        (**self).search(request).await
    }
}
