//! State owner actor
//!
//! Sole writer of the result list, the loading flag, the error slot and the
//! page cursor. Fetch lanes report to it through its inbox; it applies
//! completions one at a time and forwards summaries to external consumers.

use crate::actors::messages::{
    FetchOutcome, PipelineMessage, METHOD_INITIAL_ADMITTED, METHOD_INITIAL_COMPLETED,
    METHOD_PAGE_COMPLETED, METHOD_PAGE_STARTED, METHOD_RESET_QUERY,
};
use crate::core::{ActorController, Message, MessageHandler};
use crate::cursor::PageCursor;
use crate::error::SearchError;
use crate::sink::ResultSink;
use crate::types::{LoadCallback, PageLoad, PageRequest, Query, SearchResult};
use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub struct StateOwner {
    sink: ResultSink,
    cursor: PageCursor,
    /// Epoch of the most recently admitted initial query, `None` after a reset
    current_epoch: Option<u64>,
    current_query: Option<Query>,
    /// Fetches started and not yet completed
    outstanding: usize,
}

impl StateOwner {
    pub fn new(sink: ResultSink) -> Self {
        Self {
            sink,
            cursor: PageCursor::new(),
            current_epoch: None,
            current_query: None,
            outstanding: 0,
        }
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    fn fetch_started(&mut self) {
        self.outstanding += 1;
        self.sink.set_loading(true);
    }

    fn fetch_finished(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.sink.set_loading(self.outstanding > 0);
    }

    fn handle_initial_admitted(&mut self, epoch: u64, query: Query) {
        log::debug!("Initial query '{}' admitted (epoch {})", query, epoch);
        self.current_epoch = Some(epoch);
        self.current_query = Some(query);
        self.cursor.clear();
        self.fetch_started();
    }

    fn handle_initial_completed(
        &mut self,
        epoch: u64,
        request: PageRequest,
        outcome: FetchOutcome,
        callback: Option<LoadCallback>,
        controller: &ActorController<PipelineMessage>,
    ) {
        self.fetch_finished();

        if self.current_epoch != Some(epoch) {
            log::debug!(
                "Discarding superseded result for '{}' (epoch {}, current {:?})",
                request.query,
                epoch,
                self.current_epoch
            );
            return;
        }

        let result = match outcome {
            FetchOutcome::Completed(result) => result,
            FetchOutcome::Cancelled => {
                log::debug!("Initial fetch for '{}' was cancelled", request.query);
                return;
            }
        };

        match result {
            Ok(SearchResult {
                items, last_page, ..
            }) => {
                self.cursor.observe(last_page);
                let next_key = self.cursor.next_key(request.page_number);
                let count = items.len();
                log::info!(
                    "Query '{}' returned {} items (last page: {:?})",
                    request.query,
                    count,
                    last_page
                );

                self.sink.set_error(None);
                self.sink.reset(items.clone());
                if let Some(callback) = callback {
                    callback(Ok(PageLoad {
                        items: items.clone(),
                        next_key,
                    }));
                }

                notify(
                    controller,
                    PipelineMessage::ResultsReset {
                        query: request.query,
                        items,
                        next_key,
                    },
                );
            }
            Err(error) => self.fail(request, error, callback, controller),
        }
    }

    fn handle_page_completed(
        &mut self,
        request: PageRequest,
        lease: CancellationToken,
        outcome: FetchOutcome,
        callback: LoadCallback,
        ack: oneshot::Sender<()>,
        controller: &ActorController<PipelineMessage>,
    ) {
        self.fetch_finished();

        if lease.is_cancelled() {
            log::debug!(
                "Discarding page {} of '{}' from an invalidated source",
                request.page_number,
                request.query
            );
        } else {
            match outcome {
                FetchOutcome::Completed(Ok(SearchResult {
                    items, last_page, ..
                })) => {
                    self.cursor.observe(last_page);
                    let next_key = self.cursor.next_key(request.page_number);
                    let count = items.len();
                    log::debug!(
                        "Appending {} items of page {} for '{}'",
                        count,
                        request.page_number,
                        request.query
                    );

                    let offset = self.sink.len();
                    self.sink.append(items.clone());
                    callback(Ok(PageLoad {
                        items: items.clone(),
                        next_key,
                    }));

                    notify(
                        controller,
                        PipelineMessage::ResultsAppended {
                            page: request.page_number,
                            offset,
                            items,
                            next_key,
                        },
                    );
                }
                FetchOutcome::Completed(Err(error)) => {
                    self.fail(request, error, Some(callback), controller)
                }
                FetchOutcome::Cancelled => {
                    log::debug!("Page {} fetch was cancelled", request.page_number);
                }
            }
        }

        // The continuation lane waits for this before fetching the next page
        let _ = ack.send(());
    }

    fn fail(
        &mut self,
        request: PageRequest,
        error: SearchError,
        callback: Option<LoadCallback>,
        controller: &ActorController<PipelineMessage>,
    ) {
        log::warn!(
            "Search for '{}' page {} failed: {}",
            request.query,
            request.page_number,
            error
        );
        self.sink.set_error(Some(error.clone()));
        if let Some(callback) = callback {
            callback(Err(error.clone()));
        }
        notify(controller, PipelineMessage::SearchFailed { request, error });
    }

    fn handle_reset_query(&mut self) {
        log::debug!(
            "Resetting query state (was '{}')",
            self.current_query.as_ref().map(Query::as_str).unwrap_or("")
        );
        self.cursor.clear();
        self.current_epoch = None;
        self.current_query = None;
    }
}

fn notify(controller: &ActorController<PipelineMessage>, message: PipelineMessage) {
    let method = message.method();
    if controller.send_message(method, message).is_err() {
        log::trace!("No listener for {} notification", method);
    }
}

#[async_trait]
impl MessageHandler<PipelineMessage> for StateOwner {
    async fn on_message(
        &mut self,
        message: Message<PipelineMessage>,
        controller: &ActorController<PipelineMessage>,
    ) {
        match message.method.as_str() {
            METHOD_INITIAL_ADMITTED => {
                if let PipelineMessage::InitialAdmitted { epoch, query } = message.payload {
                    self.handle_initial_admitted(epoch, query);
                }
            }
            METHOD_INITIAL_COMPLETED => {
                if let PipelineMessage::InitialCompleted {
                    epoch,
                    request,
                    outcome,
                    callback,
                } = message.payload
                {
                    self.handle_initial_completed(epoch, request, outcome, callback, controller);
                }
            }
            METHOD_PAGE_STARTED => self.fetch_started(),
            METHOD_PAGE_COMPLETED => {
                if let PipelineMessage::PageCompleted {
                    request,
                    lease,
                    outcome,
                    callback,
                    ack,
                } = message.payload
                {
                    self.handle_page_completed(request, lease, outcome, callback, ack, controller);
                }
            }
            METHOD_RESET_QUERY => self.handle_reset_query(),
            other => {
                log::warn!("Unknown message method: {}", other);
            }
        }
    }
}
