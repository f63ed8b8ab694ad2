//! Actor implementation for notification-based communication
//!
//! An actor owns one piece of state and a message loop. Everything that wants
//! to touch that state sends a message instead, so handlers never interleave.

use crate::core::message::{Message, MessageHandler};
use std::marker::PhantomData;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A lightweight actor that processes messages one at a time.
///
/// The message loop runs as a task on the ambient tokio runtime. Messages are
/// handled strictly in arrival order; a handler finishes before the next
/// message is taken from the inbox.
pub struct Actor<T: Send + 'static, H: MessageHandler<T> + Send + 'static> {
    /// Channel for sending messages to external recipients
    sender: mpsc::UnboundedSender<Message<T>>,
    /// Channel for sending shutdown signal
    shutdown_sender: Option<oneshot::Sender<()>>,
    /// Handle to the message processing task
    task_handle: Option<JoinHandle<()>>,
    _phantom: PhantomData<H>,
}

impl<T: Send + 'static, H: MessageHandler<T> + Send + 'static> Actor<T, H> {
    /// Create a new Actor and start its message loop.
    ///
    /// # Arguments
    /// * `receiver` - Inbox of the actor
    /// * `sender` - Outbound channel for notifications
    /// * `handler` - Message handler implementation
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Message<T>>,
        sender: mpsc::UnboundedSender<Message<T>>,
        handler: H,
    ) -> Self {
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let task_handle = tokio::spawn(Self::run_message_loop(
            receiver,
            ActorController::new(sender.clone()),
            handler,
            shutdown_receiver,
        ));

        Self {
            sender,
            shutdown_sender: Some(shutdown_sender),
            task_handle: Some(task_handle),
            _phantom: PhantomData,
        }
    }

    /// Send a notification to external recipients.
    pub fn send_message(&self, method: impl Into<String>, payload: T) -> Result<(), ActorSendError> {
        self.sender
            .send(Message::new(method, payload))
            .map_err(|_| ActorSendError::ChannelClosed)
    }

    /// Whether the message loop is still running.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    async fn run_message_loop(
        mut receiver: mpsc::UnboundedReceiver<Message<T>>,
        controller: ActorController<T>,
        mut handler: H,
        mut shutdown_receiver: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_receiver => {
                    log::debug!("Received shutdown signal, stopping message loop");
                    break;
                }
                message = receiver.recv() => {
                    match message {
                        Some(message) => {
                            log::trace!("Received message: method={}", message.method);
                            handler.on_message(message, &controller).await;
                        }
                        None => {
                            log::debug!("Receiver channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Stop the message loop and wait for it to finish.
    pub async fn shutdown(&mut self) {
        log::debug!("Shutdown requested for Actor");
        self.signal_shutdown();

        if let Some(task_handle) = self.task_handle.take() {
            if let Err(e) = task_handle.await {
                log::warn!("Actor message loop ended abnormally: {}", e);
            }
        }
    }

    fn signal_shutdown(&mut self) {
        if let Some(shutdown_sender) = self.shutdown_sender.take() {
            let _ = shutdown_sender.send(());
        }
    }
}

/// Error type for Actor message sending operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorSendError {
    #[error("Actor channel is closed")]
    ChannelClosed,
}

/// Controller handed to message handlers for outbound notifications.
pub struct ActorController<T> {
    sender: mpsc::UnboundedSender<Message<T>>,
}

impl<T: Send + 'static> ActorController<T> {
    pub fn new(sender: mpsc::UnboundedSender<Message<T>>) -> Self {
        Self { sender }
    }

    /// Send a message to external recipients.
    pub fn send_message(&self, method: impl Into<String>, payload: T) -> Result<(), ActorSendError> {
        self.sender
            .send(Message::new(method, payload))
            .map_err(|_| ActorSendError::ChannelClosed)
    }
}

impl<T> Clone for ActorController<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Send + 'static, H: MessageHandler<T> + Send + 'static> Drop for Actor<T, H> {
    fn drop(&mut self) {
        if self.shutdown_sender.is_some() {
            log::debug!("Actor dropped without explicit shutdown, signalling message loop");
            self.signal_shutdown();
        }
    }
}
