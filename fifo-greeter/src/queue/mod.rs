//! Queue module: the publish/subscribe seam and its backends.
//!
//! This module provides:
//! - The [`MessageQueue`] trait implemented by every backend
//! - The [`Listener`] callback invoked once per delivered message
//! - A typed [`Publisher`] used by the HTTP layer
//!
//! ## Architecture
//!
//! ```text
//! POST /api/send-message → Publisher → MessageQueue → Subscription → Listener
//! ```
//!
//! Acknowledgement follows the listener's result: `Ok` acknowledges the
//! delivery, `Err` leaves it to the backend's redelivery policy.

pub mod amqp;
pub mod memory;
pub mod publisher;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

pub use amqp::AmqpQueue;
pub use memory::InMemoryQueue;
pub use publisher::Publisher;

/// Queue used for both publishing and consuming unless configured otherwise.
pub const DEFAULT_QUEUE: &str = "my-sqs-queue.fifo";

/// Errors reported by queue backends.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to connect to broker")]
    Connect(#[source] lapin::Error),

    #[error("failed to open channel")]
    Channel(#[source] lapin::Error),

    #[error("failed to declare queue {queue}")]
    Declare {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to publish to queue {queue}")]
    Publish {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("broker rejected message for queue {queue}")]
    Rejected { queue: String },

    #[error("failed to start consumer on queue {queue}")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to serialize payload")]
    Serialize(#[from] serde_json::Error),
}

/// A message as handed to a [`Listener`].
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub queue: String,
    pub message_id: Option<String>,
    pub body: Vec<u8>,
    /// Whether this delivery follows an earlier unacknowledged attempt
    pub redelivered: bool,
}

impl ReceivedMessage {
    /// The body as text.
    pub fn payload(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Callback invoked once per delivered message.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn on_message(&self, message: &ReceivedMessage) -> anyhow::Result<()>;
}

/// A queue backend that can publish to and consume from named queues.
#[async_trait]
pub trait MessageQueue: Send + Sync + 'static {
    /// Publish a body and wait for the backend to accept it.
    ///
    /// Returns the message id assigned to the published message.
    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<String, QueueError>;

    /// Start consuming `queue` in the background, calling `listener` per delivery.
    async fn subscribe(
        &self,
        queue: &str,
        listener: Arc<dyn Listener>,
    ) -> Result<Subscription, QueueError>;

    /// Release any connections held by the backend.
    async fn close(&self) {}
}

/// Handle to a running consumer started by [`MessageQueue::subscribe`].
pub struct Subscription {
    queue: String,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(queue: String, stop: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            queue,
            stop: Some(stop),
            task,
        }
    }

    /// Signal the consumer to stop and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Err(e) = (&mut self.task).await {
            warn!(queue = %self.queue, error = %e, "subscription_task_failed");
        }
    }
}
