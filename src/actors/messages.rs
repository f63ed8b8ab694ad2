use crate::error::SearchError;
use crate::types::{Item, LoadCallback, PageRequest, Query, SearchResult};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub const METHOD_INITIAL_ADMITTED: &str = "initialAdmitted";
pub const METHOD_INITIAL_COMPLETED: &str = "initialCompleted";
pub const METHOD_PAGE_STARTED: &str = "pageStarted";
pub const METHOD_PAGE_COMPLETED: &str = "pageCompleted";
pub const METHOD_RESET_QUERY: &str = "resetQuery";
pub const METHOD_RESULTS_RESET: &str = "resultsReset";
pub const METHOD_RESULTS_APPENDED: &str = "resultsAppended";
pub const METHOD_SEARCH_FAILED: &str = "searchFailed";

/// How a fetch ended.
#[derive(Debug)]
pub enum FetchOutcome {
    Completed(Result<SearchResult, SearchError>),
    /// Abandoned before the remote call returned
    Cancelled,
}

pub enum PipelineMessage {
    // Lane -> state owner
    InitialAdmitted {
        epoch: u64,
        query: Query,
    },
    InitialCompleted {
        epoch: u64,
        request: PageRequest,
        outcome: FetchOutcome,
        callback: Option<LoadCallback>,
    },
    PageStarted,
    PageCompleted {
        request: PageRequest,
        /// Cancelled once the paging source that asked for the page is invalidated
        lease: CancellationToken,
        outcome: FetchOutcome,
        callback: LoadCallback,
        /// Released after the callback has run
        ack: oneshot::Sender<()>,
    },
    ResetQuery,

    // State owner -> consumers
    ResultsReset {
        query: Query,
        items: Vec<Item>,
        next_key: Option<u32>,
    },
    ResultsAppended {
        page: u32,
        /// Position of the first appended item in the result list
        offset: usize,
        items: Vec<Item>,
        next_key: Option<u32>,
    },
    SearchFailed {
        request: PageRequest,
        error: SearchError,
    },
}

impl PipelineMessage {
    pub fn method(&self) -> &'static str {
        match self {
            PipelineMessage::InitialAdmitted { .. } => METHOD_INITIAL_ADMITTED,
            PipelineMessage::InitialCompleted { .. } => METHOD_INITIAL_COMPLETED,
            PipelineMessage::PageStarted => METHOD_PAGE_STARTED,
            PipelineMessage::PageCompleted { .. } => METHOD_PAGE_COMPLETED,
            PipelineMessage::ResetQuery => METHOD_RESET_QUERY,
            PipelineMessage::ResultsReset { .. } => METHOD_RESULTS_RESET,
            PipelineMessage::ResultsAppended { .. } => METHOD_RESULTS_APPENDED,
            PipelineMessage::SearchFailed { .. } => METHOD_SEARCH_FAILED,
        }
    }

    /// Wrap into an actor message named after the variant.
    pub fn into_message(self) -> crate::core::Message<PipelineMessage> {
        crate::core::Message::new(self.method(), self)
    }
}
