//! Process-local FIFO queue backend.
//!
//! Used when no broker is available and by the test suite. Each named queue
//! is a `VecDeque` guarded by a mutex; subscribers wait on a `Notify` and
//! handle one message at a time, so delivery order is publish order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex, Notify};
use tracing::{info, warn};
use uuid::Uuid;

use super::{Listener, MessageQueue, QueueError, ReceivedMessage, Subscription};

const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct InMemoryQueue {
    inner: Arc<InMemoryInner>,
}

struct InMemoryInner {
    queues: Mutex<HashMap<String, Arc<QueueState>>>,
    redelivery_delay: Duration,
}

#[derive(Default)]
struct QueueState {
    messages: Mutex<VecDeque<ReceivedMessage>>,
    notify: Notify,
}

impl QueueState {
    async fn push_back(&self, message: ReceivedMessage) {
        self.messages.lock().await.push_back(message);
        self.notify.notify_one();
    }

    async fn push_front(&self, message: ReceivedMessage) {
        self.messages.lock().await.push_front(message);
        self.notify.notify_one();
    }

    async fn pop_front(&self) -> Option<ReceivedMessage> {
        self.messages.lock().await.pop_front()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::with_redelivery_delay(DEFAULT_REDELIVERY_DELAY)
    }

    /// Create a queue that waits `delay` before redelivering a failed message.
    pub fn with_redelivery_delay(delay: Duration) -> Self {
        Self {
            inner: Arc::new(InMemoryInner {
                queues: Mutex::new(HashMap::new()),
                redelivery_delay: delay,
            }),
        }
    }

    async fn state(&self, queue: &str) -> Arc<QueueState> {
        let mut queues = self.inner.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_insert_with(|| Arc::new(QueueState::default()))
            .clone()
    }

    /// Snapshot of the messages waiting in `queue`, head first.
    pub async fn pending(&self, queue: &str) -> Vec<ReceivedMessage> {
        let state = self.state(queue).await;
        let messages = state.messages.lock().await;
        messages.iter().cloned().collect()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn publish(&self, queue: &str, body: Vec<u8>) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();

        self.state(queue)
            .await
            .push_back(ReceivedMessage {
                queue: queue.to_string(),
                message_id: Some(message_id.clone()),
                body,
                redelivered: false,
            })
            .await;

        Ok(message_id)
    }

    async fn subscribe(
        &self,
        queue: &str,
        listener: Arc<dyn Listener>,
    ) -> Result<Subscription, QueueError> {
        let state = self.state(queue).await;
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(consume_loop(
            queue.to_string(),
            state,
            listener,
            self.inner.redelivery_delay,
            stop_rx,
        ));

        info!(queue = queue, backend = "memory", "consumer_started");

        Ok(Subscription::new(queue.to_string(), stop_tx, task))
    }
}

async fn consume_loop(
    queue: String,
    state: Arc<QueueState>,
    listener: Arc<dyn Listener>,
    redelivery_delay: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let message = match state.pop_front().await {
            Some(message) => message,
            None => {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = state.notify.notified() => continue,
                }
            }
        };

        match listener.on_message(&message).await {
            Ok(()) => {}
            Err(e) => {
                warn!(
                    queue = %queue,
                    message_id = ?message.message_id,
                    error = %e,
                    "listener_failed_redelivering"
                );

                // The failed message keeps its place at the head of the queue.
                let stopping = tokio::select! {
                    _ = &mut stop => true,
                    _ = tokio::time::sleep(redelivery_delay) => false,
                };

                state
                    .push_front(ReceivedMessage {
                        redelivered: true,
                        ..message
                    })
                    .await;

                if stopping {
                    break;
                }
            }
        }

        match stop.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => {}
            Ok(()) | Err(oneshot::error::TryRecvError::Closed) => break,
        }
    }

    let pending = state.messages.lock().await.len();
    info!(queue = %queue, pending = pending, "consumer_stopped");
}
