//! Typed publisher shared by the HTTP handlers.
//!
//! Wraps whichever [`MessageQueue`] backend the process was started with and
//! can be cloned cheaply into every request task.

use std::sync::Arc;

use tracing::info;

use super::{MessageQueue, QueueError};
use crate::message::Message;

#[derive(Clone)]
pub struct Publisher {
    queue: Arc<dyn MessageQueue>,
}

impl Publisher {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Serialize `payload` and publish it to `queue_name`.
    ///
    /// Resolves once the backend has accepted the message and returns its id.
    pub async fn send(&self, queue_name: &str, payload: &Message) -> Result<String, QueueError> {
        let body = payload.to_json()?;
        let body_length = body.len();

        let message_id = self.queue.publish(queue_name, body).await?;

        info!(
            queue = queue_name,
            message_id = %message_id,
            body_length = body_length,
            "message_published"
        );

        Ok(message_id)
    }
}
