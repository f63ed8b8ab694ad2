use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text typed by the user. Queries shorter than the configured minimum are
/// inactive and never reach the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, not bytes.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this query may be dispatched (`len >= min_len`).
    pub fn is_active(&self, min_len: usize) -> bool {
        self.len() >= min_len
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// First page of a freshly typed query
    Initial,
    /// Any later page appended to the current result list
    Continuation,
}

/// One remote request. Two requests are duplicates when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub query: Query,
    pub page_size: u32,
    pub page_number: u32,
    pub kind: RequestKind,
}

impl PageRequest {
    pub fn initial(query: Query, page_size: u32) -> Self {
        Self {
            query,
            page_size,
            page_number: 1,
            kind: RequestKind::Initial,
        }
    }

    pub fn continuation(query: Query, page_size: u32, page_number: u32) -> Self {
        Self {
            query,
            page_size,
            page_number,
            kind: RequestKind::Continuation,
        }
    }
}

/// A single search hit. Only `id` and `name` are interpreted; every other
/// field of the remote record is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Parsed response of one successful remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub items: Vec<Item>,
    pub total_count: u64,
    /// Derived from the pagination header; `None` when absent or malformed.
    pub last_page: Option<u32>,
}

/// What a page load hands back to the paging layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLoad {
    pub items: Vec<Item>,
    /// Key of the next page, `None` once pagination is exhausted.
    pub next_key: Option<u32>,
}

impl PageLoad {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_key: None,
        }
    }
}

pub type LoadResult = Result<PageLoad, SearchError>;

/// Completion of a page load. Invoked at most once; dropped without being
/// invoked when the request is superseded before it is fetched.
pub type LoadCallback = Box<dyn FnOnce(LoadResult) + Send + 'static>;
