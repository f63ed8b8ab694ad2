//! Query pipeline controller
//!
//! Wires the two request lanes, the shared fetch pool and the state owner
//! together:
//!
//! ```text
//! submit_query ──► initial lane (debounce, filter, dedupe) ──┐
//!                                                           ├─► Fetcher ─► StateOwner ─► Observables
//! load_after ────► continuation lane (bounded, serial) ─────┘
//! ```

pub(crate) mod continuation_lane;
pub mod debouncer;
pub mod fetcher;
pub(crate) mod initial_lane;

use crate::actors::{PipelineMessage, StateOwner};
use crate::api::{HttpSearchClient, SearchApi};
use crate::config::SearchConfig;
use crate::core::{Actor, Message};
use crate::error::SearchError;
use crate::paging::{PagedSource, SourceFactory};
use crate::sink::{Observables, ResultSink};
use crate::types::{LoadCallback, PageRequest, Query};
use continuation_lane::{ContinuationLane, PageQueue};
use fetcher::Fetcher;
use initial_lane::{InitialCommand, InitialLane};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type PipelineEvents = mpsc::UnboundedReceiver<Message<PipelineMessage>>;

pub struct QueryPipeline {
    config: SearchConfig,
    initial_tx: mpsc::UnboundedSender<InitialCommand>,
    state_tx: mpsc::UnboundedSender<Message<PipelineMessage>>,
    sources: Arc<SourceFactory>,
    state_owner: Actor<PipelineMessage, StateOwner>,
    observables: Observables,
    shutdown: CancellationToken,
    lanes: Vec<JoinHandle<()>>,
}

impl QueryPipeline {
    /// Start a pipeline on the ambient tokio runtime.
    pub fn new(config: SearchConfig, api: Arc<dyn SearchApi>) -> Self {
        let (pipeline, _events) = Self::with_events(config, api);
        pipeline
    }

    /// Like [`QueryPipeline::new`], also returning the notifications the
    /// state owner emits (`resultsReset`, `resultsAppended`, `searchFailed`).
    pub fn with_events(config: SearchConfig, api: Arc<dyn SearchApi>) -> (Self, PipelineEvents) {
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (initial_tx, initial_rx) = mpsc::unbounded_channel();
        let (pages_tx, pages_rx) = mpsc::channel(config.continuation_capacity.max(1));

        let sink = ResultSink::new();
        let observables = sink.observables();
        let state_owner = Actor::new(state_rx, events_tx, StateOwner::new(sink));

        let shutdown = CancellationToken::new();
        let fetcher = Fetcher::new(api, config.workers);
        let sources = Arc::new(SourceFactory::new(
            PageQueue::new(pages_tx),
            config.page_size,
        ));

        let initial = InitialLane::new(
            initial_rx,
            state_tx.clone(),
            fetcher.clone(),
            sources.clone(),
            config.debounce(),
            config.min_query_len,
            shutdown.clone(),
        );
        let continuation =
            ContinuationLane::new(pages_rx, state_tx.clone(), fetcher, shutdown.clone());
        let lanes = vec![
            tokio::spawn(initial.run()),
            tokio::spawn(continuation.run()),
        ];

        log::debug!(
            "Pipeline started: {} workers, continuation capacity {}",
            config.workers,
            config.continuation_capacity
        );

        let pipeline = Self {
            config,
            initial_tx,
            state_tx,
            sources,
            state_owner,
            observables,
            shutdown,
            lanes,
        };
        (pipeline, events_rx)
    }

    /// Pipeline backed by [`HttpSearchClient`].
    pub fn with_http(config: SearchConfig) -> Result<(Self, PipelineEvents), SearchError> {
        let client = HttpSearchClient::new(&config)?;
        Ok(Self::with_events(config, Arc::new(client)))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn observables(&self) -> Observables {
        self.observables.clone()
    }

    /// Feed the current text of the search box.
    pub fn submit_query(&self, text: impl Into<Query>) {
        let request = PageRequest::initial(text.into(), self.config.initial_load_size);
        if self.initial_tx.send(InitialCommand::Submit(request)).is_err() {
            log::trace!("Initial lane stopped, ignoring query");
        }
    }

    /// Abandon the current query. Pending input and the in-flight initial
    /// fetch are dropped, the page cursor is cleared and the same text may be
    /// searched again afterwards. The visible results stay until the next
    /// successful query.
    pub fn reset_query(&self) {
        self.sources.invalidate_current();
        if self
            .state_tx
            .send(PipelineMessage::ResetQuery.into_message())
            .is_err()
        {
            log::trace!("State owner stopped, ignoring reset");
        }
        if self.initial_tx.send(InitialCommand::Reset).is_err() {
            log::trace!("Initial lane stopped, ignoring reset");
        }
        self.submit_query("");
    }

    /// Ask for page `page_number` of `query`. Only the active query can be
    /// paged; anything else is dropped and false is returned.
    pub fn request_page(
        &self,
        query: &Query,
        page_size: u32,
        page_number: u32,
        callback: LoadCallback,
    ) -> bool {
        match self.sources.current() {
            Some(source) if source.query() == query => {
                source.load_after(page_number, page_size, callback)
            }
            _ => {
                log::debug!("Ignoring page {} for inactive query '{}'", page_number, query);
                false
            }
        }
    }

    /// Paging source of the most recently admitted query.
    pub fn active_source(&self) -> Option<PagedSource> {
        self.sources.current()
    }

    /// Load the next page of the active query if one exists.
    pub fn load_more(&self) -> bool {
        self.sources
            .current()
            .map(|source| source.load_next())
            .unwrap_or(false)
    }

    /// Report that the item at `index` became visible; pulls in the next
    /// page when it is within the prefetch distance of the end.
    pub fn notify_position(&self, index: usize) -> bool {
        match self.sources.current() {
            Some(source) if source.should_prefetch(index, self.config.prefetch_distance) => {
                source.load_next()
            }
            _ => false,
        }
    }

    /// Stop both lanes and the state owner.
    pub async fn shutdown(&mut self) {
        log::debug!("Shutting down pipeline");
        self.shutdown.cancel();
        self.sources.invalidate_current();
        for lane in self.lanes.drain(..) {
            if let Err(e) = lane.await {
                log::warn!("Pipeline lane ended abnormally: {}", e);
            }
        }
        self.state_owner.shutdown().await;
    }
}

impl Drop for QueryPipeline {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
