//! Continuation lane
//!
//! Fetches follow-up pages strictly one after another, in request order. The
//! inbox is bounded; producers drop requests that do not fit instead of
//! waiting. After each fetch the lane waits until the state owner has
//! applied the page and run its callback.

use super::fetcher::Fetcher;
use crate::actors::{FetchOutcome, PipelineMessage};
use crate::core::Message;
use crate::types::{LoadCallback, PageRequest};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

pub(crate) struct PageEvent {
    pub request: PageRequest,
    pub lease: CancellationToken,
    pub callback: LoadCallback,
}

/// Producer side of the continuation lane.
#[derive(Clone)]
pub(crate) struct PageQueue {
    sender: mpsc::Sender<PageEvent>,
}

impl PageQueue {
    pub fn new(sender: mpsc::Sender<PageEvent>) -> Self {
        Self { sender }
    }

    /// Enqueue without waiting. Returns false, dropping the callback
    /// uninvoked, when the buffer is full or the lane has stopped.
    pub fn try_enqueue(
        &self,
        request: PageRequest,
        lease: CancellationToken,
        callback: LoadCallback,
    ) -> bool {
        let event = PageEvent {
            request,
            lease,
            callback,
        };
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::debug!(
                    "Continuation buffer full, dropping page {} of '{}'",
                    event.request.page_number,
                    event.request.query
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                log::trace!("Continuation lane stopped, dropping page request");
                false
            }
        }
    }
}

pub(crate) struct ContinuationLane {
    receiver: mpsc::Receiver<PageEvent>,
    state_tx: mpsc::UnboundedSender<Message<PipelineMessage>>,
    fetcher: Fetcher,
    shutdown: CancellationToken,
}

impl ContinuationLane {
    pub fn new(
        receiver: mpsc::Receiver<PageEvent>,
        state_tx: mpsc::UnboundedSender<Message<PipelineMessage>>,
        fetcher: Fetcher,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            state_tx,
            fetcher,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    log::debug!("Continuation lane shutting down");
                    break;
                }
                event = self.receiver.recv() => match event {
                    Some(event) => self.process(event).await,
                    None => {
                        log::debug!("Continuation lane input closed");
                        break;
                    }
                },
            }
        }
    }

    async fn process(&mut self, event: PageEvent) {
        let PageEvent {
            request,
            lease,
            callback,
        } = event;

        if lease.is_cancelled() {
            log::debug!(
                "Skipping page {} of '{}': source invalidated",
                request.page_number,
                request.query
            );
            return;
        }

        if self
            .state_tx
            .send(PipelineMessage::PageStarted.into_message())
            .is_err()
        {
            return;
        }

        log::debug!("Fetching page {} of '{}'", request.page_number, request.query);
        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => FetchOutcome::Cancelled,
            result = self.fetcher.fetch(&request) => FetchOutcome::Completed(result),
        };

        let (ack, applied) = oneshot::channel();
        let completed = PipelineMessage::PageCompleted {
            request,
            lease,
            outcome,
            callback,
            ack,
        };
        if self.state_tx.send(completed.into_message()).is_err() {
            log::trace!("State owner is gone, dropping page result");
            return;
        }

        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = applied => {}
        }
    }
}
