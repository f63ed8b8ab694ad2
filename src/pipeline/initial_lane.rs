//! Initial-query lane
//!
//! Debounces submissions, drops inactive and repeated queries, and starts
//! one fetch per admitted query. Admitting a query replaces the paging
//! source and cancels the fetch of the previous query; the state owner
//! discards any result that still slips through by comparing epochs.

use super::debouncer::SearchDebouncer;
use super::fetcher::Fetcher;
use crate::actors::{FetchOutcome, PipelineMessage};
use crate::core::Message;
use crate::paging::SourceFactory;
use crate::types::PageRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) enum InitialCommand {
    Submit(PageRequest),
    /// Drop pending input, cancel the in-flight fetch and forget the last
    /// admitted request so the same query may run again
    Reset,
}

pub(crate) struct InitialLane {
    receiver: mpsc::UnboundedReceiver<InitialCommand>,
    state_tx: mpsc::UnboundedSender<Message<PipelineMessage>>,
    fetcher: Fetcher,
    sources: Arc<SourceFactory>,
    debouncer: SearchDebouncer<PageRequest>,
    min_query_len: usize,
    last_admitted: Option<PageRequest>,
    epoch: u64,
    in_flight: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl InitialLane {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<InitialCommand>,
        state_tx: mpsc::UnboundedSender<Message<PipelineMessage>>,
        fetcher: Fetcher,
        sources: Arc<SourceFactory>,
        debounce: Duration,
        min_query_len: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            state_tx,
            fetcher,
            sources,
            debouncer: SearchDebouncer::with_delay(debounce),
            min_query_len,
            last_admitted: None,
            epoch: 0,
            in_flight: None,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        loop {
            let wait = self.debouncer.time_until_ready();
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    log::debug!("Initial lane shutting down");
                    break;
                }
                command = self.receiver.recv() => match command {
                    Some(InitialCommand::Submit(request)) => {
                        log::trace!("Query input: '{}'", request.query);
                        self.debouncer.set_pending(request);
                    }
                    Some(InitialCommand::Reset) => self.reset(),
                    None => {
                        log::debug!("Initial lane input closed");
                        break;
                    }
                },
                _ = sleep_for(wait) => {
                    if let Some(request) = self.debouncer.check_ready() {
                        self.admit(request);
                    }
                }
            }
        }

        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn reset(&mut self) {
        self.debouncer.clear_pending();
        self.last_admitted = None;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn admit(&mut self, request: PageRequest) {
        if !request.query.is_active(self.min_query_len) {
            log::debug!(
                "Ignoring query '{}' shorter than {} characters",
                request.query,
                self.min_query_len
            );
            return;
        }
        if self.last_admitted.as_ref() == Some(&request) {
            log::debug!("Ignoring repeated query '{}'", request.query);
            return;
        }

        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        self.epoch += 1;
        self.last_admitted = Some(request.clone());

        let epoch = self.epoch;
        let token = self.shutdown.child_token();
        self.in_flight = Some(token.clone());
        let callback = self.sources.create(request.query.clone()).initial_callback();

        log::info!("Searching '{}' (epoch {})", request.query, epoch);
        let admitted = PipelineMessage::InitialAdmitted {
            epoch,
            query: request.query.clone(),
        };
        if self.state_tx.send(admitted.into_message()).is_err() {
            log::warn!("State owner is gone, dropping query '{}'", request.query);
            return;
        }

        let fetcher = self.fetcher.clone();
        let state_tx = self.state_tx.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => FetchOutcome::Cancelled,
                result = fetcher.fetch(&request) => FetchOutcome::Completed(result),
            };
            let completed = PipelineMessage::InitialCompleted {
                epoch,
                request,
                outcome,
                callback: Some(callback),
            };
            if state_tx.send(completed.into_message()).is_err() {
                log::trace!("State owner is gone, dropping initial result");
            }
        });
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
