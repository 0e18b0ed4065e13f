//! Queue consumer that writes every delivered payload to the log.
//!
//! Returning `Ok` acknowledges the delivery. A body that is not UTF-8 is
//! reported as an error and left to the backend's redelivery policy.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::queue::{Listener, ReceivedMessage};

/// Listener that logs the raw payload string of each message.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadLogger;

#[async_trait]
impl Listener for PayloadLogger {
    async fn on_message(&self, message: &ReceivedMessage) -> Result<()> {
        let payload = message
            .payload()
            .context("message body is not valid UTF-8")?;

        info!(
            queue = %message.queue,
            message_id = message.message_id.as_deref().unwrap_or("unknown"),
            redelivered = message.redelivered,
            payload = %payload,
            "message_received"
        );

        Ok(())
    }
}
